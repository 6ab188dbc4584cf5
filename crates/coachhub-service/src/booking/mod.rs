//! Class booking: policy resolution, occupancy, the booking state machine,
//! and the transactional service around it.

pub mod engine;
pub mod occupancy;
pub mod policy;
pub mod service;

pub use engine::{
    ActionOptions, BookOptions, BookOutcome, BookRequest, BookResult, CancelOutcome, CancelResult,
    Notice, SessionBook,
};
pub use occupancy::{Occupancy, effective_capacity, occupancy};
pub use policy::{BookingWindow, EffectivePolicy, resolve_policy};
pub use service::BookingService;
