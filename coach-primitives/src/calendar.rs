//! Calendar helpers for Monday-based training weeks.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{Error, Result};

/// Returns the Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = i64::from(date.weekday().num_days_from_monday());
    date - Duration::days(offset)
}

/// Returns the Sunday closing the week that starts on `start`.
#[must_use]
pub fn week_end(start: NaiveDate) -> NaiveDate {
    start + Duration::days(6)
}

/// Returns the ISO 8601 week number for `date`.
#[must_use]
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Number of whole weeks between the weeks containing `from` and `to`.
///
/// Positive when `to` lies in a later week.
#[must_use]
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (week_start(to) - week_start(from)).num_days() / 7
}

/// Formats a week as `dd.mm.yyyy - dd.mm.yyyy` (Monday to Sunday).
#[must_use]
pub fn format_week_range(start: NaiveDate) -> String {
    let end = week_end(start);
    format!("{} - {}", start.format("%d.%m.%Y"), end.format("%d.%m.%Y"))
}

/// Human title used for a week plan record.
#[must_use]
pub fn week_title(start: NaiveDate) -> String {
    format!("Week {}: {}", iso_week(start), format_week_range(start))
}

/// Parses a `YYYY-MM-DD` date, also accepting RFC 3339 timestamps by
/// truncating to the date part.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] when the input is not a calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|err| Error::InvalidDate {
        value: value.to_owned(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_is_monday() {
        // 2026-01-28 is a Wednesday.
        assert_eq!(week_start(date(2026, 1, 28)), date(2026, 1, 26));
        // Sundays belong to the week that started six days earlier.
        assert_eq!(week_start(date(2026, 2, 1)), date(2026, 1, 26));
        assert_eq!(week_start(date(2026, 1, 26)), date(2026, 1, 26));
    }

    #[test]
    fn formats_week_range() {
        assert_eq!(
            format_week_range(date(2026, 1, 26)),
            "26.01.2026 - 01.02.2026"
        );
        assert_eq!(
            week_title(date(2026, 1, 26)),
            "Week 5: 26.01.2026 - 01.02.2026"
        );
    }

    #[test]
    fn counts_weeks_between() {
        assert_eq!(weeks_between(date(2026, 1, 28), date(2026, 2, 1)), 0);
        assert_eq!(weeks_between(date(2026, 1, 18), date(2026, 1, 28)), 2);
        assert_eq!(weeks_between(date(2026, 1, 28), date(2026, 1, 18)), -2);
    }

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(parse_date("2026-03-01").unwrap(), date(2026, 3, 1));
        assert_eq!(
            parse_date("2026-03-01T07:15:00Z").unwrap(),
            date(2026, 3, 1)
        );
        assert!(matches!(
            parse_date("March 1st"),
            Err(Error::InvalidDate { .. })
        ));
    }
}
