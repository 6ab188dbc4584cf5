//! Credit product repository implementation.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coachhub_core::error::{AppError, ErrorKind};
use coachhub_core::result::AppResult;
use coachhub_entity::credit::{CreditProduct, ProductMode};

/// Fields for creating a credit product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    /// Display name.
    pub name: String,
    /// Grant mode.
    pub mode: ProductMode,
    /// Credits per purchase or per month.
    pub credits: i32,
    /// Eligible class types.
    pub eligible_class_types: Vec<String>,
    /// Price in minor units.
    pub price_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// Provider-only flag.
    pub provider_only_purchase: bool,
}

/// Repository for credit products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a product by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CreditProduct>> {
        sqlx::query_as::<_, CreditProduct>("SELECT * FROM credit_products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find product", e))
    }

    /// Find a product by ID inside a transaction.
    pub async fn load(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Option<CreditProduct>> {
        sqlx::query_as::<_, CreditProduct>("SELECT * FROM credit_products WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load product", e))
    }

    /// Create a product.
    pub async fn create(&self, input: &CreateProduct) -> AppResult<CreditProduct> {
        sqlx::query_as::<_, CreditProduct>(
            "INSERT INTO credit_products (id, name, mode, credits, eligible_class_types, \
             price_cents, currency, provider_only_purchase) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.mode)
        .bind(input.credits)
        .bind(&input.eligible_class_types)
        .bind(input.price_cents)
        .bind(&input.currency)
        .bind(input.provider_only_purchase)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create product", e))
    }

    /// Activate or deactivate a product.
    pub async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()> {
        sqlx::query("UPDATE credit_products SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update product", e))?;
        Ok(())
    }
}
