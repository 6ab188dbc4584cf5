//! Unified application error types for CoachHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Domain failures additionally carry
//! a machine-checkable reason code (see [`codes`]).

use std::fmt;
use thiserror::Error;

/// Machine-checkable reason codes attached to domain failures.
pub mod codes {
    /// The session is not in the `SCHEDULED` state.
    pub const SESSION_NOT_SCHEDULED: &str = "SESSION_NOT_SCHEDULED";
    /// The current time lies outside the session's booking window.
    pub const BOOKING_WINDOW_CLOSED: &str = "BOOKING_WINDOW_CLOSED";
    /// The client does not hold enough available credits.
    pub const INSUFFICIENT_CREDITS: &str = "INSUFFICIENT_CREDITS";
    /// Capacity and waitlist are both exhausted.
    pub const CLASS_FULL: &str = "CLASS_FULL";
    /// The booking already carries an attendance outcome.
    pub const ATTENDANCE_ALREADY_MARKED: &str = "ATTENDANCE_ALREADY_MARKED";
    /// The booking is not in a state that allows the transition.
    pub const INVALID_BOOKING_STATE: &str = "INVALID_BOOKING_STATE";
    /// The credit submission was already approved or rejected.
    pub const ALREADY_REVIEWED: &str = "ALREADY_REVIEWED";
    /// The product can only be sold by the provider.
    pub const PROVIDER_ONLY_PRODUCT: &str = "PROVIDER_ONLY_PRODUCT";
    /// The product is deactivated.
    pub const PRODUCT_INACTIVE: &str = "PRODUCT_INACTIVE";
}

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// The resource is not in a state that allows the operation.
    InvalidState,
    /// Input validation failed.
    Validation,
    /// A capacity conflict occurred (class full, duplicate entry, etc.).
    Conflict,
    /// The client lacks the credits required for the operation.
    PaymentRequired,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind of failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidState | Self::Validation => 400,
            Self::Conflict => 409,
            Self::PaymentRequired => 402,
            Self::Database | Self::Configuration | Self::Serialization | Self::Internal => 500,
        }
    }

    /// Return the kind as an upper-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout CoachHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// Specific reason code, when the failure has one.
    pub code: Option<&'static str>,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Attach a reason code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// The reason code, falling back to the kind identifier.
    pub fn code(&self) -> &'static str {
        self.code.unwrap_or_else(|| self.kind.as_str())
    }

    /// HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Whether this error has the given reason code.
    pub fn is(&self, code: &str) -> bool {
        self.code() == code
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-state error with a reason code.
    pub fn invalid_state(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message).with_code(code)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error with a reason code.
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message).with_code(code)
    }

    /// Create a payment-required error with a reason code.
    pub fn payment_required(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PaymentRequired, message).with_code(code)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// `BOOKING_WINDOW_CLOSED`
    pub fn booking_window_closed() -> Self {
        Self::invalid_state(
            codes::BOOKING_WINDOW_CLOSED,
            "Booking window is closed for this session",
        )
    }

    /// `SESSION_NOT_SCHEDULED`
    pub fn session_not_scheduled() -> Self {
        Self::invalid_state(
            codes::SESSION_NOT_SCHEDULED,
            "Session is not open for booking changes",
        )
    }

    /// `INSUFFICIENT_CREDITS`
    pub fn insufficient_credits(required: i64, available: i64) -> Self {
        Self::payment_required(
            codes::INSUFFICIENT_CREDITS,
            format!("Insufficient credits: {required} required, {available} available"),
        )
    }

    /// `CLASS_FULL`
    pub fn class_full() -> Self {
        Self::conflict(codes::CLASS_FULL, "Class is full and the waitlist is unavailable")
    }

    /// `ATTENDANCE_ALREADY_MARKED`
    pub fn attendance_already_marked() -> Self {
        Self::invalid_state(
            codes::ATTENDANCE_ALREADY_MARKED,
            "Attendance has already been marked for this booking",
        )
    }

    /// `ALREADY_REVIEWED`
    pub fn already_reviewed() -> Self {
        Self::invalid_state(
            codes::ALREADY_REVIEWED,
            "Credit submission has already been reviewed",
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            code: self.code,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::with_source(ErrorKind::Database, format!("Database error: {err}"), err)
    }
}
