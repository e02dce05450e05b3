//! Environment-driven configuration for the stride coach.
//!
//! Variables are read through a lookup function so callers (and tests) can
//! supply values without touching the process environment.
//!
//! ## Required
//! - `INTERVALS_ATHLETE_ID`, `INTERVALS_API_KEY`
//! - `ANTHROPIC_API_KEY`
//! - `NOTION_API_KEY`, `NOTION_PLANS_DB_ID`
//! - `RACE_DATE` (`YYYY-MM-DD`), `RACE_EVENT` (`5K`, `10K`, `HalfMarathon`, `Marathon`)
//!
//! ## Optional
//! - `NOTION_ATHLETE_STATE_PAGE_ID`, `RACE_TARGET_TIME`
//! - `PLAN_START_DATE`, `PLAN_TOTAL_WEEKS`, `ATHLETE_LTHR`
//! - `ANTHROPIC_MODEL`, `COACH_MAX_TURNS` (default 4), `COACH_MAX_TOKENS`
//!   (default 2048), `COACH_HISTORY_DAYS` (default 30)
//! - `INTERVALS_BASE_URL`, `NOTION_BASE_URL`, `ANTHROPIC_BASE_URL`
//! - `TELEGRAM_BOT_TOKEN` (required by the bot), `TELEGRAM_CHAT_ID`

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod secret;
mod vars;

use std::num::NonZeroU32;

use chrono::NaiveDate;
use tracing::debug;

use coach_primitives::{RaceEvent, RaceGoal};

pub use error::{ConfigError, ConfigResult};
pub use secret::Secret;

use vars::{Vars, parse};

/// Default cap on model calls per run.
pub const DEFAULT_MAX_TURNS: u32 = 4;

/// Default output token budget per model call.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default days of activity history.
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Intervals.icu credentials and overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalsSettings {
    /// Athlete identifier, e.g. `i12345`.
    pub athlete_id: String,
    /// API key.
    pub api_key: Secret,
    /// Replaces the upstream threshold heart rate.
    pub lthr_override: Option<u32>,
    /// Alternative API root.
    pub base_url: Option<String>,
}

/// Notion credentials and database locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSettings {
    /// Integration token.
    pub api_key: Secret,
    /// Database holding week plans.
    pub plans_db_id: String,
    /// Page whose text describes the athlete's current state.
    pub athlete_state_page_id: Option<String>,
    /// Alternative API root.
    pub base_url: Option<String>,
}

/// Anthropic credentials and model selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicSettings {
    /// API key.
    pub api_key: Secret,
    /// Model identifier; the adapter default when `None`.
    pub model: Option<String>,
    /// Alternative API root.
    pub base_url: Option<String>,
}

/// Training block layout around the race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSettings {
    /// Target race.
    pub race: RaceGoal,
    /// First day of the block; derived from the race when `None`.
    pub start_date: Option<NaiveDate>,
    /// Block length; derived from the start and race dates when `None`.
    pub total_weeks: Option<u32>,
}

/// Limits applied to each coaching run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Cap on model calls.
    pub max_turns: NonZeroU32,
    /// Output token budget per model call.
    pub max_tokens: u32,
    /// Days of activity history in the snapshot.
    pub history_days: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_turns: NonZeroU32::MIN.saturating_add(DEFAULT_MAX_TURNS - 1),
            max_tokens: DEFAULT_MAX_TOKENS,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

/// Chat bot settings. Only the `bot` command needs them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelegramSettings {
    bot_token: Option<Secret>,
    /// The single chat the bot answers; every chat when `None`.
    pub chat_id: Option<i64>,
}

impl TelegramSettings {
    /// Returns the bot token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `TELEGRAM_BOT_TOKEN` is unset.
    pub fn bot_token(&self) -> ConfigResult<&Secret> {
        self.bot_token.as_ref().ok_or(ConfigError::Missing {
            vars: vec!["TELEGRAM_BOT_TOKEN"],
        })
    }
}

/// Complete coach configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachConfig {
    /// Activity source.
    pub intervals: IntervalsSettings,
    /// Plan store.
    pub notion: NotionSettings,
    /// Model provider.
    pub anthropic: AnthropicSettings,
    /// Race and block layout.
    pub plan: PlanSettings,
    /// Per-run limits.
    pub run: RunSettings,
    /// Chat front end.
    pub telegram: TelegramSettings,
}

impl CoachConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`CoachConfig::from_lookup`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] listing every absent required
    /// variable, or [`ConfigError::Invalid`] for the first unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut vars = Vars::new(lookup);

        let athlete_id = vars.required("INTERVALS_ATHLETE_ID");
        let intervals_key = vars.required("INTERVALS_API_KEY");
        let anthropic_key = vars.required("ANTHROPIC_API_KEY");
        let notion_key = vars.required("NOTION_API_KEY");
        let plans_db_id = vars.required("NOTION_PLANS_DB_ID");
        let race_date = vars.required("RACE_DATE");
        let race_event = vars.required("RACE_EVENT");
        vars.finish()?;

        let race = RaceGoal {
            date: coach_primitives::calendar::parse_date(&race_date)
                .map_err(|err| ConfigError::invalid("RACE_DATE", &race_date, err))?,
            event: parse::<RaceEvent>("RACE_EVENT", &race_event)?,
            target_time: vars.optional("RACE_TARGET_TIME"),
        };

        let defaults = RunSettings::default();
        let run = RunSettings {
            max_turns: vars.parsed("COACH_MAX_TURNS")?.unwrap_or(defaults.max_turns),
            max_tokens: vars.parsed("COACH_MAX_TOKENS")?.unwrap_or(defaults.max_tokens),
            history_days: vars.parsed("COACH_HISTORY_DAYS")?.unwrap_or(defaults.history_days),
        };

        let config = Self {
            intervals: IntervalsSettings {
                athlete_id,
                api_key: Secret::new(intervals_key),
                lthr_override: vars.parsed("ATHLETE_LTHR")?,
                base_url: vars.optional("INTERVALS_BASE_URL"),
            },
            notion: NotionSettings {
                api_key: Secret::new(notion_key),
                plans_db_id,
                athlete_state_page_id: vars.optional("NOTION_ATHLETE_STATE_PAGE_ID"),
                base_url: vars.optional("NOTION_BASE_URL"),
            },
            anthropic: AnthropicSettings {
                api_key: Secret::new(anthropic_key),
                model: vars.optional("ANTHROPIC_MODEL"),
                base_url: vars.optional("ANTHROPIC_BASE_URL"),
            },
            plan: PlanSettings {
                race,
                start_date: vars.date("PLAN_START_DATE")?,
                total_weeks: vars.parsed("PLAN_TOTAL_WEEKS")?,
            },
            run,
            telegram: TelegramSettings {
                bot_token: vars.optional("TELEGRAM_BOT_TOKEN").map(Secret::new),
                chat_id: vars.parsed("TELEGRAM_CHAT_ID")?,
            },
        };

        debug!(
            race_date = %config.plan.race.date,
            race_event = %config.plan.race.event,
            max_turns = config.run.max_turns.get(),
            bot_configured = config.telegram.bot_token.is_some(),
            "configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn required() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("INTERVALS_ATHLETE_ID", "i12345"),
            ("INTERVALS_API_KEY", "intervals-key"),
            ("ANTHROPIC_API_KEY", "anthropic-key"),
            ("NOTION_API_KEY", "notion-key"),
            ("NOTION_PLANS_DB_ID", "db-1"),
            ("RACE_DATE", "2026-05-09"),
            ("RACE_EVENT", "HalfMarathon"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> ConfigResult<CoachConfig> {
        CoachConfig::from_lookup(|name| vars.get(name).map(|value| (*value).to_owned()))
    }

    #[test]
    fn loads_required_with_defaults() {
        let config = load(&required()).unwrap();

        assert_eq!(config.intervals.athlete_id, "i12345");
        assert_eq!(config.anthropic.api_key.expose(), "anthropic-key");
        assert_eq!(config.plan.race.event, RaceEvent::HalfMarathon);
        assert_eq!(config.plan.race.date, NaiveDate::from_ymd_opt(2026, 5, 9).unwrap());
        assert_eq!(config.plan.start_date, None);
        assert_eq!(config.run, RunSettings::default());
        assert_eq!(config.run.max_turns.get(), 4);
        assert!(config.telegram.bot_token().is_err());
        assert_eq!(config.telegram.chat_id, None);
    }

    #[test]
    fn reports_every_missing_variable() {
        let mut vars = required();
        vars.remove("ANTHROPIC_API_KEY");
        vars.insert("RACE_DATE", "   ");

        let err = load(&vars).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                vars: vec!["ANTHROPIC_API_KEY", "RACE_DATE"]
            }
        );
        assert_eq!(
            err.to_string(),
            "missing required environment variables: ANTHROPIC_API_KEY, RACE_DATE"
        );
    }

    #[test]
    fn reads_optional_overrides() {
        let mut vars = required();
        vars.extend([
            ("RACE_TARGET_TIME", "1:45:00"),
            ("PLAN_START_DATE", "2026-01-05"),
            ("PLAN_TOTAL_WEEKS", "18"),
            ("ATHLETE_LTHR", "171"),
            ("ANTHROPIC_MODEL", "claude-test"),
            ("COACH_MAX_TURNS", "6"),
            ("COACH_HISTORY_DAYS", "21"),
            ("NOTION_ATHLETE_STATE_PAGE_ID", "page-9"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100200"),
        ]);

        let config = load(&vars).unwrap();
        assert_eq!(config.plan.race.target_time.as_deref(), Some("1:45:00"));
        assert_eq!(config.plan.start_date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(config.plan.total_weeks, Some(18));
        assert_eq!(config.intervals.lthr_override, Some(171));
        assert_eq!(config.anthropic.model.as_deref(), Some("claude-test"));
        assert_eq!(config.run.max_turns.get(), 6);
        assert_eq!(config.run.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.run.history_days, 21);
        assert_eq!(config.notion.athlete_state_page_id.as_deref(), Some("page-9"));
        assert_eq!(config.telegram.bot_token().unwrap().expose(), "123:abc");
        assert_eq!(config.telegram.chat_id, Some(-100_200));
    }

    #[test]
    fn rejects_unparsable_values() {
        let mut vars = required();
        vars.insert("RACE_EVENT", "ultra");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { var: "RACE_EVENT", .. }
        ));

        let mut vars = required();
        vars.insert("COACH_MAX_TURNS", "0");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { var: "COACH_MAX_TURNS", .. }
        ));

        let mut vars = required();
        vars.insert("PLAN_START_DATE", "05/01/2026");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { var: "PLAN_START_DATE", .. }
        ));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = load(&required()).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("anthropic-key"));
        assert!(!rendered.contains("notion-key"));
    }
}
