mod common;

use std::num::NonZeroU32;
use std::sync::Arc;

use serde_json::json;

use coach_adapters::memory::InMemoryPlanStore;
use coach_adapters::traits::{ContentBlock, MessageRole, ToolChoice};
use coach_kernel::{
    CoachAgent, CoachError, CollectingSink, DEFAULT_MAX_TURNS, RunConfig, RunOutcomeSink,
};
use coach_primitives::{PlanId, PlanStatus, RiskCategory, Severity};

use common::{
    ScriptedAdapter, create_args, executor, risk_args, seeded_plan, snapshot, text, today, tools,
};

fn capped(turns: u32) -> RunConfig {
    RunConfig::new(NonZeroU32::new(turns).unwrap())
}

#[tokio::test]
async fn stops_exactly_at_turn_cap() {
    let adapter =
        ScriptedAdapter::repeating(tools(vec![("n", "add_note", json!({"note": "again"}))]));
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter.clone(), executor(store)).with_config(capped(3));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    assert_eq!(outcome.turns(), 3);
    assert_eq!(adapter.requests().len(), 3);
    assert_eq!(outcome.acknowledgements().len(), 3);
    assert_eq!(outcome.result().notes, ["again", "again", "again"]);
}

#[tokio::test]
async fn default_cap_is_four_model_calls() {
    let adapter =
        ScriptedAdapter::repeating(tools(vec![("n", "add_note", json!({"note": "loop"}))]));
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter.clone(), executor(store));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    assert_eq!(outcome.turns(), DEFAULT_MAX_TURNS);
    assert_eq!(adapter.requests().len(), 4);
}

#[tokio::test]
async fn text_only_response_ends_the_run() {
    let adapter = ScriptedAdapter::new([text("Your week looks fine.")]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter.clone(), executor(store));

    let outcome = agent.run(&snapshot(None, Some("How am I doing?"))).await.unwrap();

    assert_eq!(outcome.turns(), 1);
    assert!(outcome.acknowledgements().is_empty());
    assert_eq!(outcome.result().commentary, "Your week looks fine.");
    assert_eq!(outcome.stop_reason(), Some("end_turn"));
}

#[tokio::test]
async fn tools_in_one_turn_run_in_emission_order() {
    let adapter = ScriptedAdapter::new([
        tools(vec![
            ("first", "add_note", json!({"note": "Sleep 8 hours"})),
            ("second", "flag_risk", risk_args("high_fatigue", "TSB is -15", "medium")),
        ]),
        text("Done."),
    ]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter.clone(), executor(store));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    let ids: Vec<_> = outcome
        .acknowledgements()
        .iter()
        .map(|ack| ack.tool_use_id.as_str())
        .collect();
    assert_eq!(ids, ["first", "second"]);

    // The follow-up request replays the assistant turn and answers each call in order.
    let requests = adapter.requests();
    let history = requests[1].messages();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].role(), MessageRole::Assistant);
    assert_eq!(history[2].role(), MessageRole::User);
    let answered: Vec<_> = history[2]
        .content()
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(answered, ["first", "second"]);
}

#[tokio::test]
async fn update_without_current_plan_is_reported_not_fatal() {
    let adapter = ScriptedAdapter::new([
        tools(vec![(
            "u1",
            "update_week_plan",
            json!({"weekFocus": "Recover", "plan": "Mon: Rest", "summary": "Tired"}),
        )]),
        text("I could not find a plan to update."),
    ]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter, executor(store.clone()));

    let outcome = agent.run(&snapshot(None, Some("Make this week easier"))).await.unwrap();

    assert_eq!(outcome.turns(), 2);
    let ack = &outcome.acknowledgements()[0];
    assert!(ack.is_error);
    assert!(ack.content.starts_with("Error:"));
    assert!(outcome.result().plan.is_none());
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn repeated_creates_share_the_week_identity() {
    let adapter = ScriptedAdapter::new([
        tools(vec![("c1", "create_week_plan", create_args())]),
        tools(vec![("c2", "create_week_plan", create_args())]),
        text("Plan ready."),
    ]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter, executor(store.clone()));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    let records = store.snapshot().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].plan_id, records[1].plan_id);
    assert_eq!(records[0].plan_id, PlanId::for_date(today()));
    assert_eq!(outcome.result().plan.as_ref().unwrap().id, records[1].id);
}

#[tokio::test]
async fn unknown_tool_leaves_result_untouched() {
    let adapter = ScriptedAdapter::new([
        tools(vec![("x", "bogus_tool", json!({"anything": true}))]),
        text("Sorry about that."),
    ]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter, executor(store));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    let ack = &outcome.acknowledgements()[0];
    assert!(ack.is_error);
    assert!(ack.content.contains("unrecognized"));
    let result = outcome.result();
    assert!(result.plan.is_none());
    assert!(result.risks.is_empty());
    assert!(result.notes.is_empty());
    assert_eq!(result.commentary, "Sorry about that.");
}

#[tokio::test]
async fn risks_accumulate_across_turns_in_order() {
    let adapter = ScriptedAdapter::new([
        tools(vec![
            ("r1", "flag_risk", risk_args("volume_spike", "Volume up 30%", "high")),
            ("r2", "flag_risk", risk_args("high_fatigue", "TSB is -22", "high")),
        ]),
        tools(vec![(
            "r3",
            "flag_risk",
            risk_args("inadequate_recovery", "Back-to-back hard days", "medium"),
        )]),
        text("Take it easy this week."),
    ]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter, executor(store));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    let categories: Vec<_> = outcome.result().risks.iter().map(|risk| risk.risk).collect();
    assert_eq!(
        categories,
        [
            RiskCategory::VolumeSpike,
            RiskCategory::HighFatigue,
            RiskCategory::InadequateRecovery
        ]
    );
    assert_eq!(outcome.turns(), 3);
}

#[tokio::test]
async fn creates_plan_when_none_exists() {
    let adapter = ScriptedAdapter::new([tools(vec![("c1", "create_week_plan", create_args())])]);
    let store = Arc::new(InMemoryPlanStore::new());
    let agent = CoachAgent::new(adapter, executor(store.clone())).with_config(capped(1));

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    assert_eq!(outcome.turns(), 1);
    let plan = outcome.result().plan.as_ref().unwrap();
    assert_eq!(plan.status, PlanStatus::Planned);
    assert_eq!(plan.title, "Week 8: 16.02.2026 - 22.02.2026");
    assert_eq!(plan.planned_load, Some(310.0));
    assert!(outcome.result().risks.is_empty());
    assert_eq!(store.snapshot().await.len(), 1);
}

#[tokio::test]
async fn updates_plan_and_flags_risk_then_explains() {
    let store = Arc::new(InMemoryPlanStore::new());
    let existing = seeded_plan(&store).await;
    let adapter = ScriptedAdapter::new([
        tools(vec![
            (
                "u1",
                "update_week_plan",
                json!({
                    "weekFocus": "Absorb fatigue",
                    "plan": "Mon: Rest\nTue: 30min easy",
                    "summary": "TSB is -15, easing off",
                    "plannedLoad": 240
                }),
            ),
            ("r1", "flag_risk", risk_args("high_fatigue", "TSB is -15", "medium")),
        ]),
        text("I've eased this week off."),
    ]);
    let agent = CoachAgent::new(adapter, executor(store.clone()));

    let outcome = agent
        .run(&snapshot(Some(existing.clone()), Some("I'm feeling tired")))
        .await
        .unwrap();

    assert_eq!(outcome.turns(), 2);
    let plan = outcome.result().plan.as_ref().unwrap();
    assert_eq!(plan.id, existing.id);
    assert_eq!(plan.plan, "Mon: Rest\nTue: 30min easy");
    assert_eq!(plan.week_focus.as_deref(), Some("Absorb fatigue"));
    assert_eq!(plan.planned_load, Some(240.0));
    assert_eq!(outcome.result().risks.len(), 1);
    assert_eq!(outcome.result().risks[0].severity, Severity::Medium);
    assert_eq!(outcome.result().commentary, "I've eased this week off.");
}

#[tokio::test]
async fn first_turn_forces_tools_only_without_question() {
    let scripted = || {
        ScriptedAdapter::new([
            tools(vec![("n", "add_note", json!({"note": "ok"}))]),
            text("Done."),
        ])
    };

    let scheduled = scripted();
    CoachAgent::new(scheduled.clone(), executor(Arc::new(InMemoryPlanStore::new())))
        .run(&snapshot(None, None))
        .await
        .unwrap();
    let choices: Vec<_> = scheduled.requests().iter().map(|r| r.tool_choice()).collect();
    assert_eq!(choices, [Some(ToolChoice::Any), Some(ToolChoice::Auto)]);

    let asked = scripted();
    CoachAgent::new(asked.clone(), executor(Arc::new(InMemoryPlanStore::new())))
        .run(&snapshot(None, Some("Should I run today?")))
        .await
        .unwrap();
    let choices: Vec<_> = asked.requests().iter().map(|r| r.tool_choice()).collect();
    assert_eq!(choices, [Some(ToolChoice::Auto), Some(ToolChoice::Auto)]);
}

#[tokio::test]
async fn requests_carry_prompts_tools_and_limits() {
    let adapter = ScriptedAdapter::new([text("Fine.")]);
    let agent = CoachAgent::new(adapter.clone(), executor(Arc::new(InMemoryPlanStore::new())))
        .with_config(RunConfig::default().with_max_output_tokens(4096).with_temperature(0.3));

    agent.run(&snapshot(None, None)).await.unwrap();

    let request = &adapter.requests()[0];
    assert!(request.system_prompt().unwrap().contains("HalfMarathon"));
    assert_eq!(request.tools().len(), 4);
    assert_eq!(request.max_output_tokens(), Some(4096));
    assert_eq!(request.temperature(), Some(0.3));
    let ContentBlock::Text { text } = &request.messages()[0].content()[0] else {
        panic!("first message should be text");
    };
    assert!(text.contains("No plan exists for this week yet."));
}

#[tokio::test]
async fn model_failure_aborts_the_run() {
    let adapter = ScriptedAdapter::failing();
    let agent = CoachAgent::new(adapter, executor(Arc::new(InMemoryPlanStore::new())));

    let err = agent.run(&snapshot(None, None)).await.unwrap_err();

    match err {
        CoachError::Model { provider, model, .. } => {
            assert_eq!(provider, "scripted");
            assert_eq!(model, "replay-1");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn usage_sums_across_turns_and_sink_sees_outcome() {
    let adapter = ScriptedAdapter::new([
        tools(vec![("n", "add_note", json!({"note": "Hydrate"}))]),
        text("Done."),
    ]);
    let sink = CollectingSink::new();
    let agent = CoachAgent::new(adapter, executor(Arc::new(InMemoryPlanStore::new())))
        .with_sink(sink.clone() as Arc<dyn RunOutcomeSink>);

    let outcome = agent.run(&snapshot(None, None)).await.unwrap();

    assert_eq!(outcome.usage().input_tokens, 200);
    assert_eq!(outcome.usage().output_tokens, 40);
    let recorded = sink.drain();
    assert_eq!(recorded, vec![outcome]);
}
