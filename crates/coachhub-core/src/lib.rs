//! # coachhub-core
//!
//! Core crate for CoachHub. Contains collaborator traits, configuration
//! schemas, booking domain events, calendar helpers, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other CoachHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
