//! # coachhub-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for all CoachHub entities.
//!
//! Repository methods that take a `&mut PgConnection` are meant to run
//! inside a caller-owned transaction; the rest use the pool directly.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::{connect, health_check};
