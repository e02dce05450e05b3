//! Typed access to a variable lookup.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;

use coach_primitives::calendar::parse_date;

use crate::error::{ConfigError, ConfigResult};

/// Reads variables through `lookup`, recording required ones that are absent.
pub(crate) struct Vars<F> {
    lookup: F,
    missing: Vec<&'static str>,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub(crate) fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    /// Trimmed value, `None` when unset or blank.
    pub(crate) fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    /// Value of a required variable. Absent variables are recorded and read
    /// as empty; [`Vars::finish`] reports them.
    pub(crate) fn required(&mut self, name: &'static str) -> String {
        self.optional(name).unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    /// Fails with every missing required variable at once.
    pub(crate) fn finish(&mut self) -> ConfigResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing {
                vars: std::mem::take(&mut self.missing),
            })
        }
    }

    pub(crate) fn parsed<T>(&self, name: &'static str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(name)
            .map(|raw| parse(name, &raw))
            .transpose()
    }

    pub(crate) fn date(&self, name: &'static str) -> ConfigResult<Option<NaiveDate>> {
        self.optional(name)
            .map(|raw| parse_date(&raw).map_err(|err| ConfigError::invalid(name, &raw, err)))
            .transpose()
    }
}

pub(crate) fn parse<T>(name: &'static str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|err| ConfigError::invalid(name, raw, err))
}
