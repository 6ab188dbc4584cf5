//! Class template, session, and booking entities.

pub mod booking;
pub mod session;
pub mod template;

pub use booking::{AttendanceOutcome, BookingSource, BookingStatus, ClassBooking};
pub use session::{ClassSession, SessionStatus};
pub use template::ClassTemplate;
