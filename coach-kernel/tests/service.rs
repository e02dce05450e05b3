mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use coach_adapters::memory::InMemoryPlanStore;
use coach_adapters::services::{ActivitySource, ServiceError, ServiceResult};
use coach_primitives::{
    ActivityKind, AthleteProfile, CompactActivity, RaceEvent, RaceGoal, Wellness,
};
use coach_kernel::{CoachAgent, CoachError, CoachService, SnapshotAssembler, TrainingBlock};

use common::{ScriptedAdapter, date, executor, seeded_plan, text, today};

struct FakeActivities {
    wellness: Option<Wellness>,
    fail: bool,
    oldest_seen: Mutex<Option<NaiveDate>>,
}

impl FakeActivities {
    fn new(wellness: Option<Wellness>) -> Self {
        Self {
            wellness,
            fail: false,
            oldest_seen: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ActivitySource for FakeActivities {
    async fn compact_activities(&self, oldest: NaiveDate) -> ServiceResult<Vec<CompactActivity>> {
        *self.oldest_seen.lock().unwrap() = Some(oldest);
        if self.fail {
            return Err(ServiceError::transport("Intervals.icu", "connection reset"));
        }
        let mut run = CompactActivity::new(date(2026, 2, 16), ActivityKind::Run, 45);
        run.distance_km = Some(8.2);
        Ok(vec![run])
    }

    async fn athlete_profile(&self) -> ServiceResult<AthleteProfile> {
        Ok(AthleteProfile {
            age: 35,
            max_hr: 190,
            lthr: 168,
            weight: 72.0,
        })
    }

    async fn wellness(&self, _date: NaiveDate) -> ServiceResult<Option<Wellness>> {
        Ok(self.wellness.clone())
    }
}

fn race() -> RaceGoal {
    RaceGoal {
        date: date(2026, 5, 9),
        event: RaceEvent::HalfMarathon,
        target_time: None,
    }
}

fn assembler(activities: Arc<FakeActivities>, plans: Arc<InMemoryPlanStore>) -> SnapshotAssembler {
    SnapshotAssembler::new(
        activities,
        plans,
        race(),
        TrainingBlock::for_race(race().date, None, None),
    )
}

#[tokio::test]
async fn assembles_snapshot_from_services() {
    let activities = Arc::new(FakeActivities::new(Some(Wellness::new(40.0, 55.0))));
    let store = Arc::new(InMemoryPlanStore::new().with_athlete_state("Left calf tight"));
    let existing = seeded_plan(&store).await;

    let snapshot = assembler(activities.clone(), store)
        .with_history_days(14)
        .assemble(today(), Some("   ".into()))
        .await
        .unwrap();

    assert_eq!(*activities.oldest_seen.lock().unwrap(), Some(date(2026, 2, 4)));
    assert_eq!(snapshot.recent_activities.len(), 1);
    assert_eq!(snapshot.current_week_plan, Some(existing));
    assert_eq!(snapshot.athlete_state.as_deref(), Some("Left calf tight"));
    assert!((snapshot.wellness.tsb() + 15.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.week_number, 1);
    assert_eq!(snapshot.total_weeks, 12);
    assert!(!snapshot.has_question());
}

#[tokio::test]
async fn missing_wellness_defaults_to_zero() {
    let activities = Arc::new(FakeActivities::new(None));
    let snapshot = assembler(activities, Arc::new(InMemoryPlanStore::new()))
        .assemble(today(), None)
        .await
        .unwrap();

    assert_eq!(snapshot.wellness, Wellness::default());
    assert!(snapshot.current_week_plan.is_none());
}

#[tokio::test]
async fn upstream_failure_surfaces_as_service_error() {
    let mut activities = FakeActivities::new(None);
    activities.fail = true;
    let err = assembler(Arc::new(activities), Arc::new(InMemoryPlanStore::new()))
        .assemble(today(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoachError::Service(_)));
}

#[tokio::test]
async fn service_runs_agent_over_assembled_snapshot() {
    let activities = Arc::new(FakeActivities::new(Some(Wellness::new(40.0, 55.0))));
    let store = Arc::new(InMemoryPlanStore::new());
    let adapter = ScriptedAdapter::new([text("Keep today easy.")]);
    let agent = CoachAgent::new(adapter.clone(), executor(store.clone()));
    let service = CoachService::new(assembler(activities, store), agent).with_today(today);

    let outcome = service.run(Some("Should I run today?".into())).await.unwrap();

    assert_eq!(outcome.result().commentary, "Keep today easy.");
    let request = &adapter.requests()[0];
    assert!(request.system_prompt().unwrap().contains("2026-02-18"));
}
