//! Business hours encoding
//!
//! Turns per-day display strings such as `"9:00AM - 5:00PM"` into
//! week-relative UTC second offsets and answers "open at" questions.
//!
//! Offsets count seconds from Sunday 00:00:00 UTC, so a location's hours can
//! be compared against the current instant without knowing its timezone.

mod clock;
mod encoder;
mod window;

pub use clock::*;
pub use encoder::*;
pub use window::*;

use thiserror::Error;

/// Seconds in one day
pub const DAY_SECONDS: i64 = 86_400;

/// Seconds in one week; week-relative offsets live in `[0, WEEK_SECONDS)`
pub const WEEK_SECONDS: i64 = 7 * DAY_SECONDS;

/// Errors produced while parsing or encoding business hours
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HoursError {
    #[error("'{input}' is not in the form H:MMAM - H:MMPM")]
    MalformedHours { input: String },

    #[error("'{input}' is not a valid time: {reason}")]
    InvalidTime { input: String, reason: &'static str },

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("weekday {0} is out of range (0 = Sunday .. 6 = Saturday)")]
    InvalidWeekday(u8),

    #[error("'{input}' closes before it opens")]
    InvertedWindow { input: String },

    #[error("'{input}' does not exist in timezone {timezone}")]
    NonexistentLocalTime { input: String, timezone: String },
}
