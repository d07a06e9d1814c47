use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeDelta, Utc};

use crate::SelectOption;

/// Symbolic "within the past ..." window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRangeToken {
    Past5Minutes,
    Past10Minutes,
    Past15Minutes,
    Past30Minutes,
    PastHour,
    PastTwoHours,
    PastSixHours,
    PastTwelveHours,
    PastDay,
    PastTwoDays,
    PastWeek,
    PastTwoWeeks,
    PastMonth,
    PastQuarter,
    PastSixMonths,
    PastYear,
    PastTwoYears,
    PastFourYears,
    PastFiveYears,
    PastTenYears,
}

#[derive(Debug, Clone, Copy)]
enum Span {
    Minutes(i64),
    Hours(i64),
    Days(u64),
    Months(u32),
    Years(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range '{0}'")]
pub struct UnknownTimeRange(pub String);

impl TimeRangeToken {
    pub const ALL: [TimeRangeToken; 20] = [
        TimeRangeToken::Past5Minutes,
        TimeRangeToken::Past10Minutes,
        TimeRangeToken::Past15Minutes,
        TimeRangeToken::Past30Minutes,
        TimeRangeToken::PastHour,
        TimeRangeToken::PastTwoHours,
        TimeRangeToken::PastSixHours,
        TimeRangeToken::PastTwelveHours,
        TimeRangeToken::PastDay,
        TimeRangeToken::PastTwoDays,
        TimeRangeToken::PastWeek,
        TimeRangeToken::PastTwoWeeks,
        TimeRangeToken::PastMonth,
        TimeRangeToken::PastQuarter,
        TimeRangeToken::PastSixMonths,
        TimeRangeToken::PastYear,
        TimeRangeToken::PastTwoYears,
        TimeRangeToken::PastFourYears,
        TimeRangeToken::PastFiveYears,
        TimeRangeToken::PastTenYears,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRangeToken::Past5Minutes => "past_5_minutes",
            TimeRangeToken::Past10Minutes => "past_10_minutes",
            TimeRangeToken::Past15Minutes => "past_15_minutes",
            TimeRangeToken::Past30Minutes => "past_30_minutes",
            TimeRangeToken::PastHour => "past_hour",
            TimeRangeToken::PastTwoHours => "past_two_hours",
            TimeRangeToken::PastSixHours => "past_six_hours",
            TimeRangeToken::PastTwelveHours => "past_twelve_hours",
            TimeRangeToken::PastDay => "past_day",
            TimeRangeToken::PastTwoDays => "past_two_days",
            TimeRangeToken::PastWeek => "past_week",
            TimeRangeToken::PastTwoWeeks => "past_two_weeks",
            TimeRangeToken::PastMonth => "past_month",
            TimeRangeToken::PastQuarter => "past_quarter",
            TimeRangeToken::PastSixMonths => "past_six_months",
            TimeRangeToken::PastYear => "past_year",
            TimeRangeToken::PastTwoYears => "past_two_years",
            TimeRangeToken::PastFourYears => "past_four_years",
            TimeRangeToken::PastFiveYears => "past_five_years",
            TimeRangeToken::PastTenYears => "past_ten_years",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeRangeToken::Past5Minutes => "Within the past 5 minutes",
            TimeRangeToken::Past10Minutes => "Within the past 10 minutes",
            TimeRangeToken::Past15Minutes => "Within the past 15 minutes",
            TimeRangeToken::Past30Minutes => "Within the past 30 minutes",
            TimeRangeToken::PastHour => "Within the past hour",
            TimeRangeToken::PastTwoHours => "Within the past two hours",
            TimeRangeToken::PastSixHours => "Within the past six hours",
            TimeRangeToken::PastTwelveHours => "Within the past twelve hours",
            TimeRangeToken::PastDay => "Within the past day",
            TimeRangeToken::PastTwoDays => "Within the past two days",
            TimeRangeToken::PastWeek => "Within the past week",
            TimeRangeToken::PastTwoWeeks => "Within the past two weeks",
            TimeRangeToken::PastMonth => "Within the past month",
            TimeRangeToken::PastQuarter => "Within the past quarter",
            TimeRangeToken::PastSixMonths => "Within the past six months",
            TimeRangeToken::PastYear => "Within the past year",
            TimeRangeToken::PastTwoYears => "Within the past two years",
            TimeRangeToken::PastFourYears => "Within the past four years",
            TimeRangeToken::PastFiveYears => "Within the past five years",
            TimeRangeToken::PastTenYears => "Within the past ten years",
        }
    }

    fn span(self) -> Span {
        match self {
            TimeRangeToken::Past5Minutes => Span::Minutes(5),
            TimeRangeToken::Past10Minutes => Span::Minutes(10),
            TimeRangeToken::Past15Minutes => Span::Minutes(15),
            TimeRangeToken::Past30Minutes => Span::Minutes(30),
            TimeRangeToken::PastHour => Span::Hours(1),
            TimeRangeToken::PastTwoHours => Span::Hours(2),
            TimeRangeToken::PastSixHours => Span::Hours(6),
            TimeRangeToken::PastTwelveHours => Span::Hours(12),
            TimeRangeToken::PastDay => Span::Days(1),
            TimeRangeToken::PastTwoDays => Span::Days(2),
            TimeRangeToken::PastWeek => Span::Days(7),
            TimeRangeToken::PastTwoWeeks => Span::Days(14),
            TimeRangeToken::PastMonth => Span::Months(1),
            TimeRangeToken::PastQuarter => Span::Months(3),
            TimeRangeToken::PastSixMonths => Span::Months(6),
            TimeRangeToken::PastYear => Span::Years(1),
            TimeRangeToken::PastTwoYears => Span::Years(2),
            TimeRangeToken::PastFourYears => Span::Years(4),
            TimeRangeToken::PastFiveYears => Span::Years(5),
            TimeRangeToken::PastTenYears => Span::Years(10),
        }
    }

    /// Start of the window as epoch milliseconds, or `None` if it falls
    /// outside the representable calendar.
    ///
    /// Month and year windows keep the day of month; a day past the end of
    /// the target month rolls forward into the next one (31 March minus one
    /// month is 2 March in a leap year).
    pub fn resolve(self, now: DateTime<Utc>) -> Option<i64> {
        let since = match self.span() {
            Span::Minutes(n) => now.checked_sub_signed(TimeDelta::try_minutes(n)?),
            Span::Hours(n) => now.checked_sub_signed(TimeDelta::try_hours(n)?),
            Span::Days(n) => now.checked_sub_days(Days::new(n)),
            Span::Months(n) => months_back_rolling(now, n),
            Span::Years(n) => months_back_rolling(now, n.checked_mul(12)?),
        }?;
        Some(since.timestamp_millis())
    }
}

fn months_back_rolling(now: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let total = i64::from(now.year()) * 12 + i64::from(now.month0()) - i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let date = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(now.day0())))?;
    Some(date.and_time(now.time()).and_utc())
}

impl fmt::Display for TimeRangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRangeToken {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|token| token.as_str() == s)
            .ok_or_else(|| UnknownTimeRange(s.to_owned()))
    }
}

/// Resolves a token string against `now`. Unrecognized tokens mean
/// "no time range selected" and yield `None`.
pub fn resolve(token: &str, now: DateTime<Utc>) -> Option<i64> {
    token.parse::<TimeRangeToken>().ok()?.resolve(now)
}

/// The time range stage's option list, in display order.
pub fn catalog() -> Vec<SelectOption> {
    TimeRangeToken::ALL
        .iter()
        .map(|token| SelectOption::new(token.as_str(), token.label()))
        .collect()
}
