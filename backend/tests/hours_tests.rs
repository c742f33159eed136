//! Business hours encoding tests
//!
//! Properties of the hours encoder:
//! - Encoding then decoding gives back the written hours
//! - Evening-to-morning spans close on the following day, for every weekday
//! - "Open at" checks against a real timezone

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use shared::hours::{
    decode_at, encode_at, parse_timezone, weekday_from_index, ClockTime, DayHours, HoursError,
    OpenWindow, DAY_SECONDS, WEEK_SECONDS,
};
use shared::models::{Schedule, WeeklyHours};

const HOUR: i64 = 3600;

/// Wednesday, 2024-07-10 12:00 UTC
fn july() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 10, 12, 0, 0).unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn timezone_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "America/New_York",
        "America/Chicago",
        "America/Denver",
        "America/Phoenix",
        "America/Los_Angeles",
        "Pacific/Honolulu",
        "UTC",
    ])
}

/// Same-day spans: opening between 6AM and 5PM, closing at least an hour
/// later and before midnight
fn same_day_hours_strategy() -> impl Strategy<Value = DayHours> {
    (6u32..=17, 0u32..60)
        .prop_flat_map(|(open_hour, open_minute)| {
            (
                Just(open_hour),
                Just(open_minute),
                (open_hour + 1)..=23,
                0u32..60,
            )
        })
        .prop_map(|(oh, om, ch, cm)| DayHours {
            open: ClockTime::from_hour24(oh, om),
            close: ClockTime::from_hour24(ch, cm),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Decoding an encoded day yields the weekday and hours that were written
    #[test]
    fn encode_decode_round_trip(
        hours in same_day_hours_strategy(),
        timezone in timezone_strategy(),
        weekday in 0u8..7,
    ) {
        let tz = parse_timezone(timezone).unwrap();
        let day = weekday_from_index(weekday).unwrap();
        let raw = hours.to_string();

        let encoded = encode_at(&raw, tz, day, july()).unwrap();
        prop_assert!(encoded.open_seconds < encoded.close_seconds);
        prop_assert!((0..WEEK_SECONDS).contains(&encoded.open_seconds));

        let (decoded_day, decoded) = decode_at(&encoded, tz, july());
        prop_assert_eq!(decoded_day, day);
        prop_assert_eq!(decoded, hours);
    }

    /// Every stored window lies inside the week with open before close
    #[test]
    fn windows_stay_inside_the_week(
        hours in same_day_hours_strategy(),
        timezone in timezone_strategy(),
        weekday in 0u8..7,
    ) {
        let tz = parse_timezone(timezone).unwrap();
        let day = weekday_from_index(weekday).unwrap();
        let encoded = encode_at(&hours.to_string(), tz, day, july()).unwrap();

        for window in encoded.windows() {
            prop_assert!(window.open < window.close);
            prop_assert!(window.open >= 0 && window.close < WEEK_SECONDS);
        }
    }
}

// ============================================================================
// Overnight rule
// ============================================================================

#[test]
fn overnight_spans_close_the_next_day_for_every_weekday() {
    let tz = parse_timezone("America/New_York").unwrap();

    for weekday in 0u8..7 {
        let day = weekday_from_index(weekday).unwrap();
        let encoded = encode_at("11:00PM - 2:00AM", tz, day, july()).unwrap();
        assert_eq!(
            encoded.close_seconds - encoded.open_seconds,
            3 * HOUR,
            "weekday {}",
            weekday
        );
    }
}

#[test]
fn saturday_night_wraps_into_sunday() {
    let tz = parse_timezone("UTC").unwrap();
    let saturday = weekday_from_index(6).unwrap();

    let encoded = encode_at("11:00PM - 2:00AM", tz, saturday, july()).unwrap();
    let open = 6 * DAY_SECONDS + 23 * HOUR;
    assert_eq!(encoded.open_seconds, open);
    assert_eq!(
        encoded.windows(),
        vec![
            OpenWindow { open, close: WEEK_SECONDS - 1 },
            OpenWindow { open: 0, close: 2 * HOUR },
        ]
    );
}

#[test]
fn early_to_late_does_not_roll_over() {
    let tz = parse_timezone("UTC").unwrap();
    let monday = weekday_from_index(1).unwrap();

    let encoded = encode_at("6:00AM - 11:00PM", tz, monday, july()).unwrap();
    assert_eq!(encoded.open_seconds, DAY_SECONDS + 6 * HOUR);
    assert_eq!(encoded.close_seconds, DAY_SECONDS + 23 * HOUR);
}

#[test]
fn inverted_spans_are_rejected() {
    let tz = parse_timezone("UTC").unwrap();
    let monday = weekday_from_index(1).unwrap();

    for raw in ["5:00PM - 3:00PM", "9:30AM - 9:00AM"] {
        assert!(
            matches!(
                encode_at(raw, tz, monday, july()),
                Err(HoursError::InvertedWindow { .. })
            ),
            "{} should be rejected",
            raw
        );
    }
}

// ============================================================================
// Open-at checks
// ============================================================================

#[test]
fn nine_to_five_in_new_york() {
    let hours = WeeklyHours::every_day("9:00AM - 5:00PM");
    let schedule = Schedule::build("America/New_York", hours, july()).unwrap();
    assert_eq!(schedule.windows.len(), 7);

    // 14:00 and 20:00 EDT on Wednesday
    let afternoon = Utc.with_ymd_and_hms(2024, 7, 10, 18, 0, 0).unwrap();
    let evening = Utc.with_ymd_and_hms(2024, 7, 11, 0, 0, 0).unwrap();
    assert!(schedule.is_open_now_at(afternoon));
    assert!(!schedule.is_open_now_at(evening));
}

#[test]
fn open_at_is_inclusive_at_both_ends() {
    let hours = WeeklyHours::every_day("9:00AM - 5:00PM");
    let schedule = Schedule::build("UTC", hours, july()).unwrap();

    let wednesday = 3 * DAY_SECONDS;
    assert!(schedule.is_open_at(wednesday + 9 * HOUR));
    assert!(schedule.is_open_at(wednesday + 17 * HOUR));
    assert!(!schedule.is_open_at(wednesday + 9 * HOUR - 1));
    assert!(!schedule.is_open_at(wednesday + 17 * HOUR + 1));
}

#[test]
fn one_bad_day_fails_the_schedule() {
    let mut hours = WeeklyHours::every_day("9:00AM - 5:00PM");
    hours.set(weekday_from_index(4).unwrap(), Some("9 to 5".to_string()));

    assert!(matches!(
        Schedule::build("America/Chicago", hours, july()),
        Err(HoursError::MalformedHours { .. })
    ));
}

#[test]
fn unknown_timezone_is_rejected() {
    let hours = WeeklyHours::every_day("9:00AM - 5:00PM");
    assert!(matches!(
        Schedule::build("Mars/Olympus_Mons", hours, july()),
        Err(HoursError::UnknownTimezone(_))
    ));
}
