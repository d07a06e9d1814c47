use chrono::{TimeZone, Utc};
use relay_core::time_range::{catalog, resolve};
use relay_core::TimeRangeToken;

fn ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .timestamp_millis()
}

#[test]
fn resolve_is_deterministic_for_fixed_now() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
    for token in TimeRangeToken::ALL {
        assert_eq!(resolve(token.as_str(), now), resolve(token.as_str(), now));
    }
}

#[test]
fn unknown_tokens_mean_no_selection() {
    let now = Utc::now();
    assert_eq!(resolve("bogus", now), None);
    assert_eq!(resolve("", now), None);
}

#[test]
fn fixed_spans_subtract_exact_durations() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
    assert_eq!(resolve("past_5_minutes", now), Some(ms(2024, 6, 15, 12, 25)));
    assert_eq!(resolve("past_30_minutes", now), Some(ms(2024, 6, 15, 12, 0)));
    assert_eq!(resolve("past_hour", now), Some(ms(2024, 6, 15, 11, 30)));
    assert_eq!(resolve("past_twelve_hours", now), Some(ms(2024, 6, 15, 0, 30)));
    assert_eq!(resolve("past_day", now), Some(ms(2024, 6, 14, 12, 30)));
    assert_eq!(resolve("past_two_weeks", now), Some(ms(2024, 6, 1, 12, 30)));
}

#[test]
fn month_and_year_spans_roll_missing_days_forward() {
    let now = Utc.with_ymd_and_hms(2024, 3, 31, 8, 0, 0).unwrap();
    assert_eq!(resolve("past_month", now), Some(1_709_366_400_000));
    assert_eq!(resolve("past_month", now), Some(ms(2024, 3, 2, 8, 0)));
    assert_eq!(resolve("past_quarter", now), Some(ms(2023, 12, 31, 8, 0)));
    assert_eq!(resolve("past_six_months", now), Some(ms(2023, 10, 1, 8, 0)));

    let leap_day = Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap();
    assert_eq!(resolve("past_year", leap_day), Some(ms(2023, 3, 1, 8, 0)));
    assert_eq!(resolve("past_four_years", leap_day), Some(ms(2020, 2, 29, 8, 0)));
    assert_eq!(resolve("past_ten_years", leap_day), Some(ms(2014, 3, 1, 8, 0)));
}

#[test]
fn month_span_crosses_year_boundary() {
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    assert_eq!(resolve("past_month", now), Some(ms(2023, 12, 15, 0, 0)));
    assert_eq!(resolve("past_six_months", now), Some(ms(2023, 7, 15, 0, 0)));
}

#[test]
fn catalog_lists_every_token_in_order() {
    let options = catalog();
    assert_eq!(options.len(), 20);
    assert_eq!(options[0].key, "past_5_minutes");
    assert_eq!(options[4].label, "Within the past hour");
    assert_eq!(options[19].key, "past_ten_years");
    for option in options {
        assert_eq!(option.key.parse::<TimeRangeToken>().unwrap().as_str(), option.key);
    }
}
