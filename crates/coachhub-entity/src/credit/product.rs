//! Purchasable credit products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a product grants credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductMode {
    /// Grants its credits once on approval.
    OneTimePack,
    /// Grants its credits every calendar month while subscribed.
    MonthlyTopup,
    /// Listed for information only; never grants class credits.
    CatalogOnly,
}

/// A purchasable offering.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditProduct {
    /// Unique product identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Grant mode.
    pub mode: ProductMode,
    /// Credits granted per purchase or per month.
    pub credits: i32,
    /// Class types the credits are intended for (empty = all).
    pub eligible_class_types: Vec<String>,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// Only the provider may record purchases of this product.
    pub provider_only_purchase: bool,
    /// Whether the product is offered.
    pub is_active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}
