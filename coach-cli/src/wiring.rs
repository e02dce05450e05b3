//! Builds clients and the coaching service from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use coach_adapters::anthropic::{AnthropicAdapter, AnthropicConfig, DEFAULT_MODEL};
use coach_adapters::intervals::{IntervalsClient, IntervalsConfig};
use coach_adapters::memory::InMemoryPlanStore;
use coach_adapters::notion::{NotionConfig, NotionPlanStore};
use coach_adapters::services::{ActivitySource, PlanStore};
use coach_config::CoachConfig;
use coach_kernel::{
    CoachAgent, CoachService, RunConfig, SnapshotAssembler, TracingRunSink, TrainingBlock,
};
use coach_primitives::PlanId;
use coach_tools::{ToolExecutor, coaching_registry};

pub fn activity_source(config: &CoachConfig) -> Result<IntervalsClient> {
    let settings = &config.intervals;
    let mut intervals = IntervalsConfig::new(&settings.athlete_id, settings.api_key.expose())
        .with_lthr_override(settings.lthr_override);
    if let Some(url) = &settings.base_url {
        intervals = intervals.with_base_url(url)?;
    }
    IntervalsClient::new(intervals).context("building Intervals.icu client")
}

pub fn plan_store(config: &CoachConfig) -> Result<NotionPlanStore> {
    let settings = &config.notion;
    let mut notion = NotionConfig::new(settings.api_key.expose(), &settings.plans_db_id)
        .with_athlete_state_page(settings.athlete_state_page_id.clone());
    if let Some(url) = &settings.base_url {
        notion = notion.with_base_url(url)?;
    }
    NotionPlanStore::new(notion).context("building Notion client")
}

/// In-memory copy of today's plan and athlete state; writes stay local.
pub async fn dry_run_store(
    notion: &NotionPlanStore,
    today: NaiveDate,
) -> Result<InMemoryPlanStore> {
    let plan_id = PlanId::for_date(today);
    let (current, state) =
        tokio::try_join!(notion.plan_by_id(&plan_id), notion.athlete_state())?;
    let store = InMemoryPlanStore::with_plans(current);
    Ok(match state {
        Some(state) => store.with_athlete_state(state),
        None => store,
    })
}

fn model(config: &CoachConfig) -> Result<AnthropicAdapter> {
    let settings = &config.anthropic;
    let mut anthropic = AnthropicConfig::new(settings.model.as_deref().unwrap_or(DEFAULT_MODEL))
        .with_api_key(settings.api_key.expose())
        .with_default_max_tokens(config.run.max_tokens);
    if let Some(url) = &settings.base_url {
        anthropic = anthropic.with_base_url(url)?;
    }
    AnthropicAdapter::new(anthropic).context("building Anthropic adapter")
}

pub fn coach_service(
    config: &CoachConfig,
    activities: Arc<dyn ActivitySource>,
    plans: Arc<dyn PlanStore>,
) -> Result<CoachService> {
    let adapter = model(config)?;
    let registry = coaching_registry().context("building tool registry")?;
    let executor = ToolExecutor::new(Arc::new(registry), Arc::clone(&plans));
    let agent = CoachAgent::new(Arc::new(adapter), executor)
        .with_config(
            RunConfig::new(config.run.max_turns).with_max_output_tokens(config.run.max_tokens),
        )
        .with_sink(Arc::new(TracingRunSink));

    let race = config.plan.race.clone();
    let block =
        TrainingBlock::for_race(race.date, config.plan.start_date, config.plan.total_weeks);
    info!(
        race_date = %race.date,
        event = %race.event,
        block_start = %block.start(),
        total_weeks = block.total_weeks(),
        "training block"
    );
    let assembler = SnapshotAssembler::new(activities, plans, race, block)
        .with_history_days(config.run.history_days);
    Ok(CoachService::new(assembler, agent))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn dry_run_store_starts_from_this_weeks_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/databases/db1/query"))
            .and(body_partial_json(json!({
                "filter": {"property": "Plan ID", "rich_text": {"equals": "plan-2026-w08"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;
        let notion = NotionPlanStore::new(
            NotionConfig::new("secret", "db1").with_base_url(server.uri()).unwrap(),
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();

        let store = dry_run_store(&notion, today).await.unwrap();

        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.athlete_state().await.unwrap(), None);
    }
}
