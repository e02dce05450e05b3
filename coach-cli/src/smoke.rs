//! Connectivity checks against the live services.

use std::fmt::Display;

use chrono::{Duration, NaiveDate, Utc};

use coach_adapters::services::{ActivitySource, PlanStore};
use coach_primitives::{NewWeekPlan, PlanId, TrainingGoal};

/// Outcome of one check.
#[derive(Debug)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

impl Check {
    fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
        }
    }

    fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
        }
    }

    fn error(name: &'static str, err: impl Display) -> Self {
        Self::fail(name, err.to_string())
    }
}

/// Week the write check stores its record under, far from any real plan.
fn scratch_week() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or_default()
}

pub async fn run_checks(
    activities: &dyn ActivitySource,
    plans: &dyn PlanStore,
    today: NaiveDate,
    write: bool,
) -> Vec<Check> {
    let mut checks = vec![
        athlete(activities).await,
        recent_activities(activities, today).await,
        wellness(activities, today).await,
        current_plan(plans, today).await,
        athlete_state(plans).await,
    ];
    if write {
        checks.push(create_and_fetch(plans).await);
    }
    checks
}

async fn athlete(activities: &dyn ActivitySource) -> Check {
    const NAME: &str = "Intervals.icu: Athlete Profile";
    match activities.athlete_profile().await {
        Ok(athlete) if athlete.age > 0 && athlete.max_hr > 0 && athlete.lthr > 0 => Check::pass(
            NAME,
            format!(
                "age={}, maxHR={}, LTHR={}, weight={}kg",
                athlete.age, athlete.max_hr, athlete.lthr, athlete.weight
            ),
        ),
        Ok(_) => Check::fail(NAME, "Missing required fields (age, maxHR, or LTHR)"),
        Err(err) => Check::error(NAME, err),
    }
}

async fn recent_activities(activities: &dyn ActivitySource, today: NaiveDate) -> Check {
    const NAME: &str = "Intervals.icu: Activities";
    match activities.compact_activities(today - Duration::days(30)).await {
        Ok(found) => Check::pass(NAME, format!("Found {} activities in last 30 days", found.len())),
        Err(err) => Check::error(NAME, err),
    }
}

async fn wellness(activities: &dyn ActivitySource, today: NaiveDate) -> Check {
    const NAME: &str = "Intervals.icu: Wellness";
    match activities.wellness(today).await {
        Ok(Some(wellness)) => Check::pass(
            NAME,
            format!(
                "CTL={:.1}, ATL={:.1}, TSB={:.1}",
                wellness.ctl(),
                wellness.atl(),
                wellness.tsb()
            ),
        ),
        Ok(None) => Check::fail(NAME, "No wellness data for today"),
        Err(err) => Check::error(NAME, err),
    }
}

async fn current_plan(plans: &dyn PlanStore, today: NaiveDate) -> Check {
    const NAME: &str = "Notion: Get Current Week Plan";
    let plan_id = PlanId::for_date(today);
    match plans.plan_by_id(&plan_id).await {
        Ok(Some(plan)) => Check::pass(
            NAME,
            format!("Found plan \"{}\" ({}, {})", plan.title, plan.status, plan.goal),
        ),
        Ok(None) => Check::pass(NAME, format!("No plan exists for {plan_id} (this is OK)")),
        Err(err) => Check::error(NAME, err),
    }
}

async fn athlete_state(plans: &dyn PlanStore) -> Check {
    const NAME: &str = "Notion: Athlete State";
    match plans.athlete_state().await {
        Ok(Some(state)) => Check::pass(
            NAME,
            format!("Loaded {} chars from athlete state page", state.chars().count()),
        ),
        Ok(None) => Check::pass(NAME, "No athlete state page configured or page is empty"),
        Err(err) => Check::error(NAME, err),
    }
}

async fn create_and_fetch(plans: &dyn PlanStore) -> Check {
    const NAME: &str = "Notion: Create & Fetch Plan";
    let mut plan = NewWeekPlan::generated_for(
        scratch_week(),
        TrainingGoal::Recovery,
        "Mon: Test\nTue: Test\nWed: Test",
        Utc::now(),
    );
    plan.summary = Some("Automated smoke test".to_owned());
    plan.planned_load = Some(50.0);

    let created = match plans.create_plan(plan).await {
        Ok(created) => created,
        Err(err) => return Check::error(NAME, err),
    };
    match plans.plan_by_id(&created.plan_id).await {
        Ok(Some(fetched)) if fetched.plan == created.plan => Check::pass(
            NAME,
            format!(
                "Created plan {}, lastUpdated={}",
                created.plan_id,
                fetched.last_updated.to_rfc3339()
            ),
        ),
        Ok(Some(_)) => Check::fail(NAME, "Fetched plan body differs from the one written"),
        Ok(None) => Check::fail(NAME, "Plan was created but could not be fetched back"),
        Err(err) => Check::error(NAME, err),
    }
}

/// Prints every check and returns how many failed.
pub fn report(checks: &[Check]) -> usize {
    println!("\n=== Results ===\n");
    for check in checks {
        let icon = if check.passed { '✓' } else { '✗' };
        println!("{icon} {}\n  {}\n", check.name, check.message);
    }
    let failed = checks.iter().filter(|check| !check.passed).count();
    println!("=== {} passed, {failed} failed ===", checks.len() - failed);
    failed
}
