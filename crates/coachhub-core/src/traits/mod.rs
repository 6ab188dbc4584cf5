//! Core traits defined in `coachhub-core` and implemented by other crates.

pub mod notifier;
pub mod settings;

pub use notifier::BookingNotifier;
pub use settings::SettingsProvider;
