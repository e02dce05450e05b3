//! Collaborator traits for the activity source and the plan store.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use coach_primitives::{
    AthleteProfile, CompactActivity, NewWeekPlan, PlanId, WeekPlan, WeekPlanUpdate, Wellness,
};

/// Result alias used by service clients.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised by upstream service clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Client is misconfigured.
    #[error("{service} client not configured: {reason}")]
    Configuration {
        /// Service name.
        service: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// The request could not be completed.
    #[error("{service} transport error: {reason}")]
    Transport {
        /// Service name.
        service: &'static str,
        /// Underlying failure.
        reason: String,
    },

    /// The service answered with a non-success status.
    #[error("{service} API error: {status} {body}")]
    Status {
        /// Service name.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("{service} response error: {reason}")]
    Decode {
        /// Service name.
        service: &'static str,
        /// Decoder failure.
        reason: String,
    },

    /// A record addressed by key does not exist.
    #[error("{service}: {what} not found")]
    NotFound {
        /// Service name.
        service: &'static str,
        /// Description of the missing record.
        what: String,
    },
}

impl ServiceError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            service,
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(service: &'static str, reason: impl ToString) -> Self {
        Self::Transport {
            service,
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for decode failures.
    #[must_use]
    pub fn decode(service: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            service,
            reason: reason.to_string(),
        }
    }
}

/// Source of activity history and fitness metrics.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Activities since `oldest` (inclusive), condensed for model context.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the upstream call fails.
    async fn compact_activities(&self, oldest: NaiveDate) -> ServiceResult<Vec<CompactActivity>>;

    /// Static athlete physiology.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the upstream call fails.
    async fn athlete_profile(&self) -> ServiceResult<AthleteProfile>;

    /// Fitness metrics for `date`; `None` when the service has no record.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for any failure other than a missing record.
    async fn wellness(&self, date: NaiveDate) -> ServiceResult<Option<Wellness>>;
}

/// Durable storage of weekly plans.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Looks up the plan stored under a derived identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the store cannot be queried.
    async fn plan_by_id(&self, id: &PlanId) -> ServiceResult<Option<WeekPlan>>;

    /// Persists a new plan record.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the record cannot be written.
    async fn create_plan(&self, plan: NewWeekPlan) -> ServiceResult<WeekPlan>;

    /// Replaces fields of the record stored under `record_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown records and other
    /// variants when the write fails.
    async fn update_plan(&self, record_id: &str, update: WeekPlanUpdate)
    -> ServiceResult<WeekPlan>;

    /// Free-form athlete notes, `None` when absent or not configured.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the store cannot be read.
    async fn athlete_state(&self) -> ServiceResult<Option<String>>;
}
