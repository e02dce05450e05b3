//! Week plan identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::calendar::week_start;

/// Identifier of a weekly plan, derived from the Monday the week starts on.
///
/// The textual form is `plan-<iso-year>-w<2-digit iso week>`. There is
/// exactly one current plan per week, so the identifier is never supplied by
/// callers: it is always computed from a date.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanId {
    year: i32,
    week: u32,
}

impl PlanId {
    /// Derives the identifier for the week containing `date`.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let iso = week_start(date).iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Returns the ISO week-numbering year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the ISO week number.
    #[must_use]
    pub const fn week(&self) -> u32 {
        self.week
    }
}

impl Display for PlanId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "plan-{}-w{:02}", self.year, self.week)
    }
}

impl FromStr for PlanId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidPlanId {
            id: s.to_owned(),
            reason: reason.to_owned(),
        };

        let rest = s
            .strip_prefix("plan-")
            .ok_or_else(|| invalid("missing `plan-` prefix"))?;
        let (year, week) = rest
            .split_once("-w")
            .ok_or_else(|| invalid("missing `-w` week separator"))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| invalid("year is not a number"))?;
        if week.len() != 2 {
            return Err(invalid("week must have two digits"));
        }
        let week = week
            .parse::<u32>()
            .map_err(|_| invalid("week is not a number"))?;
        if !(1..=53).contains(&week) {
            return Err(invalid("week must be between 01 and 53"));
        }

        Ok(Self { year, week })
    }
}

impl TryFrom<String> for PlanId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlanId> for String {
    fn from(value: PlanId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn derives_from_any_day_of_the_week() {
        let monday = PlanId::for_date(date(2026, 1, 26));
        let sunday = PlanId::for_date(date(2026, 2, 1));
        assert_eq!(monday, sunday);
        assert_eq!(monday.to_string(), "plan-2026-w05");
    }

    #[test]
    fn uses_iso_week_year_at_year_boundary() {
        // Monday 2025-12-29 opens ISO week 1 of 2026.
        let id = PlanId::for_date(date(2025, 12, 31));
        assert_eq!(id.to_string(), "plan-2026-w01");
    }

    #[test]
    fn round_trip_plan_id() {
        let id = PlanId::for_date(date(2026, 10, 19));
        let parsed = id.to_string().parse::<PlanId>().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["plan-2026-5", "2026-w05", "plan-2026-w5", "plan-x-w05", "plan-2026-w60"] {
            assert!(
                matches!(raw.parse::<PlanId>(), Err(Error::InvalidPlanId { .. })),
                "{raw} should be rejected"
            );
        }
    }
}
