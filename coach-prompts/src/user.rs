//! Initial user message: activity history by week and the current plan.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use coach_primitives::calendar::{week_start, weeks_between};
use coach_primitives::{CompactActivity, InputSnapshot, WeekPlan};

/// Renders the first user message of a run.
///
/// Activities are grouped by Monday-start week, oldest week first, and each
/// group is labelled relative to the week containing `snapshot.today`.
#[must_use]
pub fn build_user_message(snapshot: &InputSnapshot) -> String {
    let mut message = String::from("## Recent Activities\n");
    message.push_str(&activity_history(&snapshot.recent_activities, snapshot.today));
    message.push('\n');

    match &snapshot.current_week_plan {
        Some(plan) => message.push_str(&current_plan(plan)),
        None => {
            message.push_str("No plan exists for this week yet. Please create a training plan.");
        }
    }

    if let Some(question) = snapshot.question.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        message.push_str("\n\n## Athlete Question\n");
        message.push_str(question);
    }

    message
}

/// Label of the week starting on `start`, relative to the week of `today`.
#[must_use]
pub fn week_label(start: NaiveDate, today: NaiveDate) -> String {
    match weeks_between(start, today) {
        n if n <= 0 => "This Week".to_owned(),
        1 => "Last Week".to_owned(),
        n => format!("{n} Weeks Ago"),
    }
}

fn activity_history(activities: &[CompactActivity], today: NaiveDate) -> String {
    if activities.is_empty() {
        return "No activities recorded.\n".to_owned();
    }

    let mut weeks: BTreeMap<NaiveDate, Vec<&CompactActivity>> = BTreeMap::new();
    for activity in activities {
        weeks.entry(week_start(activity.date)).or_default().push(activity);
    }

    let mut out = String::new();
    for (start, mut group) in weeks {
        group.sort_by_key(|activity| activity.date);
        out.push_str(&week_header(start, today, &group));
        for activity in group {
            out.push_str(&activity_line(activity));
            out.push('\n');
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

fn week_header(start: NaiveDate, today: NaiveDate, group: &[&CompactActivity]) -> String {
    let distance: f64 = group.iter().filter_map(|activity| activity.distance_km).sum();
    let load: f64 = group.iter().filter_map(|activity| activity.load).sum();
    let noun = if group.len() == 1 { "activity" } else { "activities" };
    format!(
        "### {} (from {start}): {} {noun}, {distance:.1} km, {load:.0} TSS\n",
        week_label(start, today),
        group.len(),
    )
}

fn activity_line(activity: &CompactActivity) -> String {
    let mut line = format!("{} | {} | {}min", activity.date, activity.kind, activity.duration_min);
    if let Some(distance) = activity.distance_km {
        line.push_str(&format!(" | {distance}km"));
    }
    if let Some(avg_hr) = activity.avg_hr {
        line.push_str(&format!(" | {avg_hr}bpm avg"));
    }
    if let Some(load) = activity.load {
        line.push_str(&format!(" | {load} TSS"));
    }
    if let Some(feel) = activity.feel {
        line.push_str(&format!(" | feel:{feel}/5"));
    }
    if let Some(rpe) = activity.rpe {
        line.push_str(&format!(" | RPE:{rpe}/10"));
    }
    if !activity.intervals.is_empty() {
        line.push_str(&format!(" | intervals: {}", activity.intervals.join(", ")));
    }
    if let Some(notes) = activity.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
        line.push_str(&format!(" | \"{notes}\""));
    }
    line
}

fn current_plan(plan: &WeekPlan) -> String {
    let load = plan
        .planned_load
        .map_or_else(|| "not set".to_owned(), |load| format!("{load} TSS"));
    let mut out = format!(
        "## Current Week Plan\nStatus: {}\nGoal: {}\nPlanned Load: {load}\n",
        plan.status, plan.goal
    );
    if let Some(focus) = &plan.week_focus {
        out.push_str(&format!("Focus: {focus}\n"));
    }
    out.push_str(&format!("\nPlan:\n{}\n\n", plan.plan));
    if let Some(summary) = &plan.summary {
        out.push_str(&format!("Previous notes: {summary}\n\n"));
    }
    out.push_str("Please review the current plan and training progress. Adjust if needed.");
    out
}
