//! Weekly schedules and their encoded windows

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::hours::{
    display_hours, encode_at, parse_timezone, week_seconds_at, HoursError, OpenWindow,
    OpenWindows, WEEKDAYS,
};

/// Which of a location's two schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    General,
    KidFriendly,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::General => "general",
            ScheduleKind::KidFriendly => "kid_friendly",
        }
    }
}

/// Raw hours per weekday as entered by the owner; `None` means closed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyHours {
    pub sunday: Option<String>,
    pub monday: Option<String>,
    pub tuesday: Option<String>,
    pub wednesday: Option<String>,
    pub thursday: Option<String>,
    pub friday: Option<String>,
    pub saturday: Option<String>,
}

impl WeeklyHours {
    /// Same hours every day of the week
    pub fn every_day(raw: &str) -> Self {
        let day = Some(raw.to_string());
        Self {
            sunday: day.clone(),
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day.clone(),
            saturday: day,
        }
    }

    pub fn get(&self, weekday: Weekday) -> Option<&str> {
        let day = match weekday {
            Weekday::Sun => &self.sunday,
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
        };
        day.as_deref()
    }

    pub fn set(&mut self, weekday: Weekday, raw: Option<String>) {
        let day = match weekday {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        };
        *day = raw;
    }

    /// Open days in Sunday-first order. Blank strings count as closed.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &str)> {
        WEEKDAYS.into_iter().filter_map(move |weekday| {
            self.get(weekday)
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
                .map(|raw| (weekday, raw))
        })
    }

    pub fn is_closed_all_week(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Display form with whole hours shortened
    pub fn display(&self) -> WeeklyHours {
        let mut shown = WeeklyHours::default();
        for (weekday, raw) in self.iter() {
            shown.set(weekday, Some(display_hours(raw)));
        }
        shown
    }
}

/// A schedule with its timezone and the windows derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub timezone: String,
    pub hours: WeeklyHours,
    pub windows: OpenWindows,
}

impl Schedule {
    /// Encode every open day of `hours`.
    ///
    /// Fails on the first bad day; nothing is produced unless every day
    /// encodes.
    pub fn build(
        timezone: &str,
        hours: WeeklyHours,
        reference: DateTime<Utc>,
    ) -> Result<Self, HoursError> {
        let tz: Tz = parse_timezone(timezone)?;

        let mut windows: Vec<OpenWindow> = Vec::with_capacity(7);
        for (weekday, raw) in hours.iter() {
            let encoded = encode_at(raw, tz, weekday, reference)?;
            windows.extend(encoded.windows());
        }

        Ok(Self {
            timezone: tz.name().to_string(),
            hours,
            windows: OpenWindows::new(windows),
        })
    }

    pub fn is_open_at(&self, week_seconds: i64) -> bool {
        self.windows.is_open_at(week_seconds)
    }

    pub fn is_open_now_at(&self, instant: DateTime<Utc>) -> bool {
        self.is_open_at(week_seconds_at(instant))
    }
}

/// Schedule as returned to clients: raw and display strings, no windows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleView {
    pub timezone: String,
    pub hours: WeeklyHours,
    pub display: WeeklyHours,
}

impl From<&Schedule> for ScheduleView {
    fn from(schedule: &Schedule) -> Self {
        Self {
            timezone: schedule.timezone.clone(),
            hours: schedule.hours.clone(),
            display: schedule.hours.display(),
        }
    }
}
