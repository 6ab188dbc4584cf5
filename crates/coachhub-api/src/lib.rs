//! # coachhub-api
//!
//! HTTP API layer for CoachHub built on Axum.
//!
//! Exposes the booking, credit, and review operations as JSON endpoints
//! under `/api`, with request logging, CORS, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
