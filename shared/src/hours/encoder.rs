//! Local business hours to week-relative UTC offsets

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::{ClockTime, DayHours, HoursError, OpenWindow, WEEK_SECONDS};

/// Weekdays in schedule order, index 0 = Sunday
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Map a schedule index (0 = Sunday .. 6 = Saturday) to a weekday
pub fn weekday_from_index(index: u8) -> Result<Weekday, HoursError> {
    WEEKDAYS
        .get(usize::from(index))
        .copied()
        .ok_or(HoursError::InvalidWeekday(index))
}

/// Resolve an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, HoursError> {
    name.parse::<Tz>()
        .map_err(|_| HoursError::UnknownTimezone(name.to_string()))
}

/// Seconds elapsed since Sunday 00:00:00 UTC of the instant's week
pub fn week_seconds_at(instant: DateTime<Utc>) -> i64 {
    i64::from(instant.weekday().num_days_from_sunday()) * super::DAY_SECONDS
        + i64::from(instant.num_seconds_from_midnight())
}

/// One encoded day: opening offset and the real closing offset.
///
/// `close_seconds` may run past [`WEEK_SECONDS`] when a Saturday span (after
/// timezone conversion) crosses into Sunday; [`EncodedDay::windows`] splits
/// such a span at the week boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedDay {
    pub open_seconds: i64,
    pub close_seconds: i64,
}

impl EncodedDay {
    /// Windows to store for this day, one or two of them
    pub fn windows(&self) -> Vec<OpenWindow> {
        if self.close_seconds < WEEK_SECONDS {
            return vec![OpenWindow {
                open: self.open_seconds,
                close: self.close_seconds,
            }];
        }

        let mut windows = vec![OpenWindow {
            open: self.open_seconds,
            close: WEEK_SECONDS - 1,
        }];
        let spill = self.close_seconds - WEEK_SECONDS;
        if spill > 0 {
            windows.push(OpenWindow {
                open: 0,
                close: spill,
            });
        }
        windows
    }
}

/// Encode one day's hours using the current week as reference
pub fn encode(raw: &str, timezone: &str, weekday: u8) -> Result<EncodedDay, HoursError> {
    encode_at(
        raw,
        parse_timezone(timezone)?,
        weekday_from_index(weekday)?,
        Utc::now(),
    )
}

/// Encode one day's hours against the local week containing `reference`.
///
/// The reference fixes which UTC offset applies, so hours encoded in July and
/// in January differ by the daylight-saving shift of the timezone.
pub fn encode_at(
    raw: &str,
    timezone: Tz,
    weekday: Weekday,
    reference: DateTime<Utc>,
) -> Result<EncodedDay, HoursError> {
    let hours: DayHours = raw.parse()?;

    let open_date = local_date_in_week(timezone, weekday, reference);
    let close_date = if hours.closes_next_day() {
        open_date + Days::new(1)
    } else {
        open_date
    };

    let open_utc = to_utc(timezone, open_date, hours.open, raw)?;
    let close_utc = to_utc(timezone, close_date, hours.close, raw)?;

    let span = (close_utc - open_utc).num_seconds();
    if span <= 0 {
        return Err(HoursError::InvertedWindow {
            input: raw.to_string(),
        });
    }

    let open_seconds = week_seconds_at(open_utc);
    Ok(EncodedDay {
        open_seconds,
        close_seconds: open_seconds + span,
    })
}

/// Project an encoded day back to local hours, relative to the UTC week of
/// `reference`.
pub fn decode_at(encoded: &EncodedDay, timezone: Tz, reference: DateTime<Utc>) -> (Weekday, DayHours) {
    let week_start = reference
        - Duration::seconds(week_seconds_at(reference))
        - Duration::nanoseconds(i64::from(reference.timestamp_subsec_nanos()));

    let open = (week_start + Duration::seconds(encoded.open_seconds)).with_timezone(&timezone);
    let close = (week_start + Duration::seconds(encoded.close_seconds)).with_timezone(&timezone);

    (
        open.weekday(),
        DayHours {
            open: ClockTime::from_hour24(open.hour(), open.minute()),
            close: ClockTime::from_hour24(close.hour(), close.minute()),
        },
    )
}

fn local_date_in_week(timezone: Tz, weekday: Weekday, reference: DateTime<Utc>) -> NaiveDate {
    let today = reference.with_timezone(&timezone).date_naive();
    let sunday = today - Days::new(u64::from(today.weekday().num_days_from_sunday()));
    sunday + Days::new(u64::from(weekday.num_days_from_sunday()))
}

fn to_utc(timezone: Tz, date: NaiveDate, time: ClockTime, raw: &str) -> Result<DateTime<Utc>, HoursError> {
    let nonexistent = || HoursError::NonexistentLocalTime {
        input: raw.to_string(),
        timezone: timezone.name().to_string(),
    };

    let naive = date
        .and_hms_opt(time.hour24(), time.minute, 0)
        .ok_or_else(nonexistent)?;

    // Inside a spring-forward gap the wall clock has already jumped an hour
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| timezone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(nonexistent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::{DAY_SECONDS, WEEK_SECONDS};

    fn july() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2024, 7, 10, 12, 0, 0).unwrap()
    }

    fn january() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn week_seconds_counts_from_sunday() {
        let sunday_midnight = Utc.with_ymd_and_hms(2024, 7, 7, 0, 0, 0).unwrap();
        assert_eq!(week_seconds_at(sunday_midnight), 0);

        let monday_noon = Utc.with_ymd_and_hms(2024, 7, 8, 12, 0, 0).unwrap();
        assert_eq!(week_seconds_at(monday_noon), DAY_SECONDS + 12 * 3600);

        let saturday_last = Utc.with_ymd_and_hms(2024, 7, 13, 23, 59, 59).unwrap();
        assert_eq!(week_seconds_at(saturday_last), WEEK_SECONDS - 1);
    }

    #[test]
    fn utc_day_encodes_directly() {
        let encoded = encode_at("9:00AM - 5:00PM", Tz::UTC, Weekday::Mon, july()).unwrap();
        assert_eq!(encoded.open_seconds, DAY_SECONDS + 9 * 3600);
        assert_eq!(encoded.close_seconds, DAY_SECONDS + 17 * 3600);
    }

    #[test]
    fn new_york_summer_is_four_hours_behind() {
        let tz = parse_timezone("America/New_York").unwrap();
        let encoded = encode_at("9:00AM - 5:00PM", tz, Weekday::Tue, july()).unwrap();
        assert_eq!(encoded.open_seconds, 2 * DAY_SECONDS + 13 * 3600);
        assert_eq!(encoded.close_seconds, 2 * DAY_SECONDS + 21 * 3600);
    }

    #[test]
    fn new_york_winter_is_five_hours_behind() {
        let tz = parse_timezone("America/New_York").unwrap();
        let encoded = encode_at("9:00AM - 5:00PM", tz, Weekday::Tue, january()).unwrap();
        assert_eq!(encoded.open_seconds, 2 * DAY_SECONDS + 14 * 3600);
    }

    #[test]
    fn evening_in_the_west_shifts_utc_weekday() {
        // 8 PM Monday in Los Angeles is 3 AM Tuesday UTC
        let tz = parse_timezone("America/Los_Angeles").unwrap();
        let encoded = encode_at("8:00PM - 11:00PM", tz, Weekday::Mon, july()).unwrap();
        assert_eq!(encoded.open_seconds, 2 * DAY_SECONDS + 3 * 3600);
        assert_eq!(encoded.close_seconds, 2 * DAY_SECONDS + 6 * 3600);
    }

    #[test]
    fn overnight_span_closes_next_day() {
        let encoded = encode_at("11:00PM - 2:00AM", Tz::UTC, Weekday::Wed, july()).unwrap();
        assert_eq!(encoded.open_seconds, 3 * DAY_SECONDS + 23 * 3600);
        assert_eq!(encoded.close_seconds, 4 * DAY_SECONDS + 2 * 3600);
        assert_eq!(encoded.windows().len(), 1);
    }

    #[test]
    fn saturday_overnight_splits_at_week_end() {
        let encoded = encode_at("11:00PM - 2:00AM", Tz::UTC, Weekday::Sat, july()).unwrap();
        assert_eq!(encoded.open_seconds, 6 * DAY_SECONDS + 23 * 3600);
        assert_eq!(encoded.close_seconds, WEEK_SECONDS + 2 * 3600);

        let windows = encoded.windows();
        assert_eq!(
            windows,
            vec![
                OpenWindow {
                    open: 6 * DAY_SECONDS + 23 * 3600,
                    close: WEEK_SECONDS - 1,
                },
                OpenWindow {
                    open: 0,
                    close: 2 * 3600,
                },
            ]
        );
    }

    #[test]
    fn long_day_does_not_roll_over() {
        let encoded = encode_at("6:00AM - 11:00PM", Tz::UTC, Weekday::Fri, july()).unwrap();
        assert_eq!(encoded.open_seconds, 5 * DAY_SECONDS + 6 * 3600);
        assert_eq!(encoded.close_seconds, 5 * DAY_SECONDS + 23 * 3600);
    }

    #[test]
    fn inverted_same_day_spans_fail() {
        for raw in ["5:00PM - 3:00PM", "9:30AM - 9:00AM", "11:00AM - 12:00AM", "4:00PM - 4:00PM"] {
            assert!(
                matches!(
                    encode_at(raw, Tz::UTC, Weekday::Mon, july()),
                    Err(HoursError::InvertedWindow { .. })
                ),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn unknown_timezone_fails() {
        assert_eq!(
            encode("9:00AM - 5:00PM", "Mars/Olympus_Mons", 1),
            Err(HoursError::UnknownTimezone("Mars/Olympus_Mons".to_string()))
        );
    }

    #[test]
    fn weekday_out_of_range_fails() {
        assert_eq!(
            encode("9:00AM - 5:00PM", "UTC", 7),
            Err(HoursError::InvalidWeekday(7))
        );
    }

    #[test]
    fn spring_forward_gap_uses_shifted_time() {
        // 2:30 AM on 2024-03-10 does not exist in New York
        let tz = parse_timezone("America/New_York").unwrap();
        let reference = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let encoded = encode_at("2:30AM - 6:00AM", tz, Weekday::Sun, reference).unwrap();
        // 3:30 AM EDT = 7:30 UTC, 6:00 AM EDT = 10:00 UTC
        assert_eq!(encoded.open_seconds, 7 * 3600 + 30 * 60);
        assert_eq!(encoded.close_seconds, 10 * 3600);
    }

    #[test]
    fn decode_restores_local_hours() {
        let tz = parse_timezone("Europe/Berlin").unwrap();
        let encoded = encode_at("10:30AM - 1:00AM", tz, Weekday::Thu, july()).unwrap();
        let (weekday, hours) = decode_at(&encoded, tz, july());
        assert_eq!(weekday, Weekday::Thu);
        assert_eq!(hours.to_string(), "10:30AM - 1:00AM");
    }
}
