//! Time-period calculations for report windows
//!
//! All timestamps exchanged with callers use [`TIMESTAMP_FORMAT`]
//! (`YYYY-MM-DD HH:MM:SS`) with no offset embedded. The timezone is resolved
//! once by the entry point; nothing here reads the clock on its own except
//! [`now_in`].

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{Error, Result};

/// Timestamp format used for report windows and exported date columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const AVERAGE_DAYS_IN_MONTH: f64 = 365.0 / 12.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Unit used when shifting a timestamp back in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
        }
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" | "hours" => Ok(Self::Hours),
            "day" | "days" => Ok(Self::Days),
            "week" | "weeks" => Ok(Self::Weeks),
            "month" | "months" => Ok(Self::Months),
            _ => Err(format!(
                "Unknown time unit: {}. Available: hours, days, weeks, months",
                s
            )),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Elapsed time between two timestamps, in fractional units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    pub days: f64,
    pub weeks: f64,
    /// Approximation: `days / (365 / 12)`, not a calendar-month count
    pub months: f64,
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp
pub fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|source| Error::Parse {
        input: timestamp.to_string(),
        source,
    })
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Move a timestamp `amount` units into the past.
///
/// Months are calendar-aware: the day is clamped to the end of the target
/// month, so 2024-03-31 minus one month is 2024-02-29.
pub fn shift_back(timestamp: NaiveDateTime, unit: TimeUnit, amount: u32) -> Result<NaiveDateTime> {
    let amount_i64 = i64::from(amount);
    let shifted = match unit {
        TimeUnit::Hours => Duration::try_hours(amount_i64)
            .and_then(|d| timestamp.checked_sub_signed(d)),
        TimeUnit::Days => Duration::try_days(amount_i64)
            .and_then(|d| timestamp.checked_sub_signed(d)),
        TimeUnit::Weeks => Duration::try_weeks(amount_i64)
            .and_then(|d| timestamp.checked_sub_signed(d)),
        TimeUnit::Months => timestamp.checked_sub_months(Months::new(amount)),
    };

    shifted.ok_or_else(|| {
        Error::InvalidData(format!(
            "{} {} before {} is out of range",
            amount,
            unit,
            format_timestamp(&timestamp)
        ))
    })
}

/// Take a timestamp string and return the timestamp string `amount` units earlier
pub fn offset(timestamp: &str, unit: TimeUnit, amount: u32) -> Result<String> {
    let parsed = parse_timestamp(timestamp)?;
    let shifted = shift_back(parsed, unit, amount)?;
    Ok(format_timestamp(&shifted))
}

pub fn hours_ago(timestamp: &str, hours: u32) -> Result<String> {
    offset(timestamp, TimeUnit::Hours, hours)
}

pub fn days_ago(timestamp: &str, days: u32) -> Result<String> {
    offset(timestamp, TimeUnit::Days, days)
}

pub fn weeks_ago(timestamp: &str, weeks: u32) -> Result<String> {
    offset(timestamp, TimeUnit::Weeks, weeks)
}

pub fn months_ago(timestamp: &str, months: u32) -> Result<String> {
    offset(timestamp, TimeUnit::Months, months)
}

/// Convert days into an average-month equivalent
pub fn days_to_months(days: f64) -> f64 {
    days / AVERAGE_DAYS_IN_MONTH
}

/// Calculate the days, weeks and months between two timestamps.
///
/// There is no check that `end >= start`; a reversed window yields negative values.
pub fn elapsed(start: NaiveDateTime, end: NaiveDateTime) -> Period {
    let delta = end - start;
    let days = delta.num_milliseconds() as f64 / MILLIS_PER_DAY;
    let period = Period {
        days,
        weeks: days / 7.0,
        months: days_to_months(days),
    };

    debug!(
        start = %start,
        end = %end,
        minutes = delta.num_minutes(),
        days = period.days,
        weeks = period.weeks,
        months = period.months,
        "Calculated time periods"
    );

    period
}

/// Same as [`elapsed`], parsing both timestamps first
pub fn elapsed_between(start: &str, end: &str) -> Result<Period> {
    Ok(elapsed(parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Parse an IANA timezone name such as `Australia/Sydney`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| Error::Config(format!("Unknown timezone '{}': {}", name, e)))
}

/// Current wall-clock time in `tz`, without the offset
pub fn now_in(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

/// Interpret a naive window bound in `tz` for the API's RFC 3339 filters.
///
/// Ambiguous local times resolve to the earlier instant. Local times skipped
/// by a DST transition are moved forward one hour.
pub fn to_source_bound(timestamp: NaiveDateTime, tz: Tz) -> Result<DateTime<FixedOffset>> {
    tz.from_local_datetime(&timestamp)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(timestamp + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| {
            Error::InvalidData(format!(
                "{} does not exist in timezone {}",
                format_timestamp(&timestamp),
                tz
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "2023-06-08 08:58:07";

    #[test]
    fn test_offset_each_unit() {
        assert_eq!(hours_ago(SAMPLE, 1).unwrap(), "2023-06-08 07:58:07");
        assert_eq!(days_ago(SAMPLE, 1).unwrap(), "2023-06-07 08:58:07");
        assert_eq!(weeks_ago(SAMPLE, 1).unwrap(), "2023-06-01 08:58:07");
        assert_eq!(months_ago(SAMPLE, 1).unwrap(), "2023-05-08 08:58:07");
    }

    #[test]
    fn test_offset_zero_is_identity() {
        for unit in [TimeUnit::Hours, TimeUnit::Days, TimeUnit::Weeks, TimeUnit::Months] {
            assert_eq!(offset(SAMPLE, unit, 0).unwrap(), SAMPLE);
        }
    }

    #[test]
    fn test_months_are_calendar_aware() {
        assert_eq!(
            months_ago("2024-03-31 12:00:00", 1).unwrap(),
            "2024-02-29 12:00:00"
        );
        assert_eq!(
            months_ago("2023-03-31 12:00:00", 1).unwrap(),
            "2023-02-28 12:00:00"
        );
        assert_eq!(
            months_ago("2024-01-15 00:00:00", 3).unwrap(),
            "2023-10-15 00:00:00"
        );
    }

    #[test]
    fn test_offset_rejects_bad_format() {
        let err = offset("2023-06-08T08:58:07", TimeUnit::Days, 1).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let err = offset("08/06/2023 08:58:07", TimeUnit::Days, 1).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_elapsed_two_weeks() {
        let period = elapsed_between("2024-01-01 00:00:00", "2024-01-15 00:00:00").unwrap();
        assert_eq!(period.days, 14.0);
        assert_eq!(period.weeks, 2.0);
        assert!((period.months - 14.0 / (365.0 / 12.0)).abs() < 1e-12);
    }

    #[test]
    fn test_elapsed_fractional_days() {
        let period = elapsed_between("2024-01-01 00:00:00", "2024-01-01 18:00:00").unwrap();
        assert_eq!(period.days, 0.75);
    }

    #[test]
    fn test_elapsed_negative_window() {
        let period = elapsed_between("2024-01-15 00:00:00", "2024-01-01 00:00:00").unwrap();
        assert_eq!(period.days, -14.0);
        assert_eq!(period.weeks, -2.0);
        assert!(period.months < 0.0);
    }

    #[test]
    fn test_offset_then_elapsed_round_trip() {
        for n in [0u32, 1, 6, 13, 52, 400] {
            let back = days_ago(SAMPLE, n).unwrap();
            let period = elapsed_between(&back, SAMPLE).unwrap();
            assert!((period.days - f64::from(n)).abs() < 1e-9, "days {}", n);

            let back = weeks_ago(SAMPLE, n).unwrap();
            let period = elapsed_between(&back, SAMPLE).unwrap();
            assert!((period.weeks - f64::from(n)).abs() < 1e-9, "weeks {}", n);
        }
    }

    #[test]
    fn test_time_unit_from_str() {
        assert_eq!("weeks".parse::<TimeUnit>().unwrap(), TimeUnit::Weeks);
        assert_eq!("Month".parse::<TimeUnit>().unwrap(), TimeUnit::Months);
        assert!("fortnights".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_to_source_bound_uses_timezone_offset() {
        let tz = parse_timezone("Australia/Sydney").unwrap();
        // January is daylight saving time in Sydney (+11:00)
        let bound = to_source_bound(parse_timestamp("2024-01-10 09:00:00").unwrap(), tz).unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-01-10T09:00:00+11:00");
        // July is standard time (+10:00)
        let bound = to_source_bound(parse_timestamp("2024-07-10 09:00:00").unwrap(), tz).unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-07-10T09:00:00+10:00");
    }

    #[test]
    fn test_to_source_bound_in_dst_gap_moves_forward() {
        let tz = parse_timezone("Australia/Sydney").unwrap();
        // Clocks jump from 02:00 to 03:00 on 2024-10-06
        let bound = to_source_bound(parse_timestamp("2024-10-06 02:30:00").unwrap(), tz).unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-10-06T03:30:00+11:00");
    }

    #[test]
    fn test_to_source_bound_ambiguous_takes_earlier() {
        let tz = parse_timezone("Australia/Sydney").unwrap();
        // 02:00-03:00 happens twice on 2024-04-07
        let bound = to_source_bound(parse_timestamp("2024-04-07 02:30:00").unwrap(), tz).unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-04-07T02:30:00+11:00");
    }

    #[test]
    fn test_parse_timezone_unknown() {
        assert!(matches!(
            parse_timezone("Mars/Olympus_Mons"),
            Err(Error::Config(_))
        ));
    }
}
