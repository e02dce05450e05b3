//! Human-readable rendering of a run result for chat and console output.

use coach_primitives::RunResult;

/// Reply sent when a run produced nothing to report.
pub const EMPTY_REPLY: &str = "All good! Let me know if you have any other questions.";

/// Renders commentary, plan summary, risks and notes.
///
/// Sections without content are omitted; an entirely empty result yields
/// [`EMPTY_REPLY`].
#[must_use]
pub fn format_run_result(result: &RunResult) -> String {
    let mut reply = String::new();

    let commentary = result.commentary.trim();
    if !commentary.is_empty() {
        reply.push_str(commentary);
        reply.push_str("\n\n");
    }

    if let Some(plan) = &result.plan {
        reply.push_str(&format!("📋 *{}*\nGoal: {}\n", plan.title, plan.goal));
        if let Some(load) = plan.planned_load.filter(|load| *load > 0.0) {
            reply.push_str(&format!("Load: {load} TSS\n"));
        }
        reply.push('\n');
        if let Some(focus) = plan.week_focus.as_deref().filter(|focus| !focus.trim().is_empty()) {
            reply.push_str(focus);
            reply.push_str("\n\n");
        }
    }

    if let Some(note) = &result.daily_note {
        reply.push_str(&format!("🏃 *Today*\n{note}\n\n"));
    }

    if !result.risks.is_empty() {
        reply.push_str("⚠️ *Risks Flagged*\n");
        for risk in &result.risks {
            reply.push_str(&format!("• [{}] {}\n", risk.severity, risk.message));
        }
        reply.push('\n');
    }

    if !result.notes.is_empty() {
        reply.push_str("📝 *Notes*\n");
        for note in &result.notes {
            reply.push_str(&format!("• {note}\n"));
        }
    }

    let reply = reply.trim();
    if reply.is_empty() {
        EMPTY_REPLY.to_owned()
    } else {
        reply.to_owned()
    }
}
