//! Parsing of 12-hour clock strings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::HoursError;

/// AM/PM designator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => write!(f, "AM"),
            Meridiem::Pm => write!(f, "PM"),
        }
    }
}

/// A wall-clock time as written on a sign: hour 1-12, minute, AM/PM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    pub meridiem: Meridiem,
}

impl ClockTime {
    /// Build from a 24-hour clock reading
    pub fn from_hour24(hour: u32, minute: u32) -> Self {
        let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
        let hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        Self {
            hour,
            minute,
            meridiem,
        }
    }

    /// Hour on the 24-hour clock. 12 AM is midnight (0), 12 PM is noon.
    pub fn hour24(&self) -> u32 {
        match (self.meridiem, self.hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        }
    }

    pub fn seconds_of_day(&self) -> i64 {
        i64::from(self.hour24()) * 3600 + i64::from(self.minute) * 60
    }
}

impl FromStr for ClockTime {
    type Err = HoursError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &'static str| HoursError::InvalidTime {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        if trimmed.len() < 3 || !trimmed.is_char_boundary(trimmed.len() - 2) {
            return Err(invalid("missing AM/PM designator"));
        }
        let (clock, designator) = trimmed.split_at(trimmed.len() - 2);
        let meridiem = match designator.to_ascii_uppercase().as_str() {
            "AM" => Meridiem::Am,
            "PM" => Meridiem::Pm,
            _ => return Err(invalid("missing AM/PM designator")),
        };

        let (hour, minute) = clock
            .trim_end()
            .split_once(':')
            .ok_or_else(|| invalid("expected H:MM"))?;

        if hour.is_empty() || hour.len() > 2 || !hour.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("hour must be a number"));
        }
        if minute.len() != 2 || !minute.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("minutes must be two digits"));
        }

        let hour: u32 = hour.parse().map_err(|_| invalid("hour must be a number"))?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| invalid("minutes must be two digits"))?;

        if !(1..=12).contains(&hour) {
            return Err(invalid("hour must be between 1 and 12"));
        }
        if minute > 59 {
            return Err(invalid("minutes must be between 00 and 59"));
        }

        Ok(Self {
            hour,
            minute,
            meridiem,
        })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}{}", self.hour, self.minute, self.meridiem)
    }
}

/// One day's opening and closing time, e.g. `"11:00AM - 2:00AM"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub open: ClockTime,
    pub close: ClockTime,
}

impl DayHours {
    /// Whether the closing time falls on the calendar day after the opening.
    ///
    /// Morning-to-morning spans roll over only when the closing hour is
    /// numerically smaller than the opening hour, comparing the hours as
    /// written. Evening-to-morning spans always roll over.
    pub fn closes_next_day(&self) -> bool {
        match (self.open.meridiem, self.close.meridiem) {
            (Meridiem::Am, Meridiem::Am) => self.close.hour < self.open.hour,
            (Meridiem::Pm, Meridiem::Am) => true,
            (Meridiem::Am, Meridiem::Pm) | (Meridiem::Pm, Meridiem::Pm) => false,
        }
    }
}

impl FromStr for DayHours {
    type Err = HoursError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (open, close) = s.split_once(" - ").ok_or_else(|| HoursError::MalformedHours {
            input: s.to_string(),
        })?;

        Ok(Self {
            open: open.parse()?,
            close: close.parse()?,
        })
    }
}

impl fmt::Display for DayHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.open, self.close)
    }
}

/// Cosmetic form of a raw hours string with whole-hour minutes dropped.
///
/// `"9:00AM - 5:30PM"` becomes `"9AM - 5:30PM"`. Display only.
pub fn display_hours(raw: &str) -> String {
    raw.replace(":00", "")
}
