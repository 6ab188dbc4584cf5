//! Core type definitions used across the CoachHub workspace.

pub mod month;

pub use month::{MonthKey, end_of_month_utc, month_key};
