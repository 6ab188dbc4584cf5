//! HTTP request handlers.

pub mod booking;
pub mod credit;
pub mod health;
