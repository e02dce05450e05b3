#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};

use coach_adapters::memory::InMemoryPlanStore;
use coach_adapters::services::PlanStore;
use coach_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, ContentBlock, InferenceRequest,
    InferenceResponse, ModelAdapter, Usage,
};
use coach_primitives::{
    AthleteProfile, InputSnapshot, NewWeekPlan, RaceEvent, RaceGoal, TrainingGoal, WeekPlan,
    Wellness,
};
use coach_tools::{ToolExecutor, coaching_registry};

/// Adapter replaying queued responses and recording every request.
///
/// Once the queue is drained the fallback response is repeated; without a
/// fallback the adapter fails.
pub struct ScriptedAdapter {
    metadata: AdapterMetadata,
    responses: Mutex<VecDeque<InferenceResponse>>,
    fallback: Option<InferenceResponse>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedAdapter {
    pub fn new(responses: impl IntoIterator<Item = InferenceResponse>) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("scripted", "replay-1"),
            responses: Mutex::new(responses.into_iter().collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Vec::<InferenceResponse>::new())
    }

    pub fn repeating(response: InferenceResponse) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("scripted", "replay-1"),
            responses: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<InferenceResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| AdapterError::transport("script exhausted"))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    date(2026, 2, 18)
}

pub fn snapshot(current: Option<WeekPlan>, question: Option<&str>) -> InputSnapshot {
    InputSnapshot {
        athlete: AthleteProfile {
            age: 35,
            max_hr: 190,
            lthr: 168,
            weight: 72.0,
        },
        wellness: Wellness::new(40.0, 55.0),
        recent_activities: Vec::new(),
        current_week_plan: current,
        race_goal: RaceGoal {
            date: date(2026, 5, 9),
            event: RaceEvent::HalfMarathon,
            target_time: Some("1:45:00".into()),
        },
        week_number: 1,
        total_weeks: 12,
        athlete_state: None,
        question: question.map(str::to_owned),
        today: today(),
    }
}

/// Persists a plan for the current week and returns the stored record.
pub async fn seeded_plan(store: &InMemoryPlanStore) -> WeekPlan {
    let plan = NewWeekPlan::generated_for(
        today(),
        TrainingGoal::BuildFitness,
        "Mon: Rest\nTue: 8km easy",
        Utc::now(),
    );
    store.create_plan(plan).await.unwrap()
}

pub fn executor(store: Arc<dyn PlanStore>) -> ToolExecutor {
    ToolExecutor::new(Arc::new(coaching_registry().unwrap()), store)
}

pub fn text(body: &str) -> InferenceResponse {
    InferenceResponse::new(vec![ContentBlock::text(body)])
        .with_stop_reason("end_turn")
        .with_usage(Usage {
            input_tokens: 100,
            output_tokens: 20,
        })
}

pub fn tools(calls: Vec<(&str, &str, Value)>) -> InferenceResponse {
    InferenceResponse::new(
        calls
            .into_iter()
            .map(|(id, name, input)| ContentBlock::tool_use(id, name, input))
            .collect(),
    )
    .with_stop_reason("tool_use")
    .with_usage(Usage {
        input_tokens: 100,
        output_tokens: 20,
    })
}

pub fn create_args() -> Value {
    json!({
        "goal": "Build Fitness",
        "weekFocus": "Aerobic base",
        "plan": "Mon: Rest\nTue: 8km easy\nThu: 6x800m\nSun: 16km long",
        "summary": "Base building with one quality session",
        "plannedLoad": 310
    })
}

pub fn risk_args(risk: &str, message: &str, severity: &str) -> Value {
    json!({"risk": risk, "message": message, "severity": severity})
}
