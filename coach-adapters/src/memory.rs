//! Process-local plan store used for dry runs and tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use coach_primitives::{NewWeekPlan, PlanId, WeekPlan, WeekPlanUpdate};

use crate::services::{PlanStore, ServiceError, ServiceResult};

const SERVICE: &str = "memory";

/// Plan store holding records in memory.
///
/// Creating a second record for an existing plan id keeps both; lookups
/// return the most recently written one.
#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    plans: RwLock<Vec<WeekPlan>>,
    athlete_state: Option<String>,
}

impl InMemoryPlanStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing records.
    #[must_use]
    pub fn with_plans(plans: impl IntoIterator<Item = WeekPlan>) -> Self {
        Self {
            plans: RwLock::new(plans.into_iter().collect()),
            athlete_state: None,
        }
    }

    /// Sets the athlete state text.
    #[must_use]
    pub fn with_athlete_state(mut self, state: impl Into<String>) -> Self {
        self.athlete_state = Some(state.into());
        self
    }

    /// Returns every stored record in write order.
    pub async fn snapshot(&self) -> Vec<WeekPlan> {
        self.plans.read().await.clone()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn plan_by_id(&self, id: &PlanId) -> ServiceResult<Option<WeekPlan>> {
        let plans = self.plans.read().await;
        Ok(plans.iter().rev().find(|plan| &plan.plan_id == id).cloned())
    }

    async fn create_plan(&self, plan: NewWeekPlan) -> ServiceResult<WeekPlan> {
        let record = plan.into_record(Uuid::new_v4().to_string());
        self.plans.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_plan(
        &self,
        record_id: &str,
        update: WeekPlanUpdate,
    ) -> ServiceResult<WeekPlan> {
        let mut plans = self.plans.write().await;
        let position = plans
            .iter()
            .position(|plan| plan.id == record_id)
            .ok_or_else(|| ServiceError::NotFound {
                service: SERVICE,
                what: format!("plan record `{record_id}`"),
            })?;
        let updated = update.apply_to(&plans[position]);
        plans.remove(position);
        plans.push(updated.clone());
        Ok(updated)
    }

    async fn athlete_state(&self) -> ServiceResult<Option<String>> {
        Ok(self.athlete_state.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use coach_primitives::TrainingGoal;

    use super::*;

    fn new_plan(body: &str) -> NewWeekPlan {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        NewWeekPlan::generated_for(date, TrainingGoal::BuildFitness, body, Utc::now())
    }

    #[tokio::test]
    async fn latest_write_wins_for_a_plan_id() {
        let store = InMemoryPlanStore::new();
        let first = store.create_plan(new_plan("first")).await.unwrap();
        let second = store.create_plan(new_plan("second")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.plan_id, second.plan_id);
        let found = store.plan_by_id(&first.plan_id).await.unwrap().unwrap();
        assert_eq!(found.plan, "second");
    }

    #[tokio::test]
    async fn updates_existing_record() {
        let store = InMemoryPlanStore::new();
        let created = store.create_plan(new_plan("old")).await.unwrap();
        let update = WeekPlanUpdate {
            title: created.title.clone(),
            week_focus: Some("Easy week".into()),
            plan: "new".into(),
            summary: None,
            planned_load: Some(250.0),
            last_updated: Utc::now(),
        };

        let updated = store.update_plan(&created.id, update.clone()).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.plan, "new");
        assert_eq!(store.snapshot().await.len(), 1);

        let err = store.update_plan("nope", update).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
