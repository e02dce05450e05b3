//! System prompt: persona, athlete context, and coaching policy.

use coach_primitives::InputSnapshot;
use coach_primitives::calendar::weeks_between;

use crate::template::{PromptResult, PromptTemplate, TemplateVars};

const SYSTEM_TEMPLATE: &str = "\
You are an experienced running coach helping an athlete prepare for a {{event}} race.

## Athlete Profile
- Age: {{age}}
- Max HR: {{max_hr}} bpm
- Lactate Threshold HR: {{lthr}} bpm
- Weight: {{weight}} kg

## Race Goal
- Event: {{event}}
- Date: {{race_date}}
- Target: {{target}}
- Week {{week_number}} of {{total_weeks}} in the training block ({{phase}})

## Today
- Date: {{today}} ({{weekday}})
- Weeks to race: {{weeks_to_race}}

## Current Fitness Status
- CTL (Fitness): {{ctl}}
- ATL (Fatigue): {{atl}}
- TSB (Form): {{tsb}}
{{wellness_extras}}
## Training Philosophy
1. **Injury Prevention First**: Never increase weekly running volume by more than 12% week-over-week
2. **Cross-Training Counts**: Cycling and gym work contribute to overall fatigue (ATL) but not run-specific fitness
3. **Polarized Training**: Keep roughly 80% of running easy (Zone 1-2) and 20% hard, with 1-2 quality sessions per week
4. **Progressive Overload**: Build load gradually for three weeks, then schedule a recovery week every fourth week with 20-30% less volume
5. **Listen to the Body**: If TSB is very negative (< -20), prioritize recovery
6. **Taper**: In the last three weeks before the race, cut volume progressively (about 20%, 40%, then 60% below peak) while keeping short efforts at race pace

## HR Zones (based on LTHR {{lthr}})
- Zone 1 (Recovery): < {{z1}} bpm
- Zone 2 (Aerobic): {{z1}}-{{z2}} bpm
- Zone 3 (Tempo): {{z2}}-{{z3}} bpm
- Zone 4 (Threshold): {{z3}}-{{z4}} bpm
- Zone 5 (VO2max): > {{z4}} bpm

## Technique Focus
This week's cue: {{technique_cue}}
Weave it into one or two easy runs.

## Plan Format
When creating or updating plans, use this format for each day:
Mon: [workout description]
Tue: [workout description]
...
Sun: [workout description]

Include specific details: distance/duration, intensity (HR zone or pace), and any intervals.
For rest days, simply write \"Rest\" or suggest active recovery.
{{athlete_state}}
## Your Task
Analyze the athlete's recent training and current status. Then:
1. If no plan exists for this week, create one using create_week_plan
2. If a plan exists, evaluate if adjustments are needed based on actual training vs planned, and use update_week_plan
3. Flag any injury risks using flag_risk if you see concerning patterns
4. Add coaching notes using add_note for important observations

Be specific, practical, and prioritize the athlete's long-term health over short-term gains.{{question_instructions}}";

const QUESTION_INSTRUCTIONS: &str = "

## Athlete Question
The athlete has asked a question, shown at the end of the user message. Answer it \
conversationally in plain text, in addition to any tool calls you make. Keep the answer \
short and practical since it is delivered as a chat message.";

const TECHNIQUE_CUES: [&str; 6] = [
    "Cadence: aim for quick, light steps around 170-180 per minute",
    "Posture: run tall with a slight forward lean from the ankles",
    "Arm swing: relaxed shoulders, elbows near 90 degrees, hands brushing the hips",
    "Foot strike: land under your centre of mass rather than reaching forward",
    "Breathing: settle into a steady rhythm and use it to gauge easy effort",
    "Relaxation: unclench hands and jaw, especially late in runs",
];

/// Heart-rate zone boundaries derived from the lactate-threshold heart rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeartRateZones {
    /// Upper bound of Zone 1 (81% of LTHR).
    pub recovery: u32,
    /// Upper bound of Zone 2 (90% of LTHR).
    pub aerobic: u32,
    /// Upper bound of Zone 3 (95% of LTHR).
    pub tempo: u32,
    /// Upper bound of Zone 4 (LTHR).
    pub threshold: u32,
}

impl HeartRateZones {
    /// Computes rounded zone boundaries.
    #[must_use]
    pub fn from_lthr(lthr: u32) -> Self {
        Self {
            recovery: percent_of(lthr, 0.81),
            aerobic: percent_of(lthr, 0.90),
            tempo: percent_of(lthr, 0.95),
            threshold: lthr,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_of(value: u32, fraction: f64) -> u32 {
    (f64::from(value) * fraction).round() as u32
}

/// Technique cue for the given training-block week, cycling through a fixed list.
#[must_use]
pub fn technique_cue(week_number: u32) -> &'static str {
    let index = week_number.saturating_sub(1) as usize % TECHNIQUE_CUES.len();
    TECHNIQUE_CUES[index]
}

/// Training phase label for the week.
fn phase(week_number: u32, weeks_to_race: i64) -> &'static str {
    if weeks_to_race <= 0 {
        "race week"
    } else if weeks_to_race <= 3 {
        "taper"
    } else if week_number > 0 && week_number % 4 == 0 {
        "recovery week"
    } else {
        "build"
    }
}

/// Renders the system prompt for one invocation.
///
/// The output depends only on the snapshot, including `snapshot.today`.
///
/// # Errors
///
/// Returns [`crate::PromptError`] if the embedded template is inconsistent.
pub fn build_system_prompt(snapshot: &InputSnapshot) -> PromptResult<String> {
    let athlete = &snapshot.athlete;
    let wellness = &snapshot.wellness;
    let race = &snapshot.race_goal;
    let zones = HeartRateZones::from_lthr(athlete.lthr);
    let weeks_to_race = weeks_between(snapshot.today, race.date);

    let mut extras = String::new();
    if let Some(resting_hr) = wellness.resting_hr() {
        extras.push_str(&format!("- Resting HR: {resting_hr} bpm\n"));
    }
    if let Some(weight) = wellness.weight() {
        extras.push_str(&format!("- Current weight: {weight} kg\n"));
    }

    let athlete_state = snapshot
        .athlete_state
        .as_deref()
        .map(str::trim)
        .filter(|state| !state.is_empty())
        .map(|state| format!("\n## Athlete Notes\n{state}\n"))
        .unwrap_or_default();

    let question_instructions = if snapshot.has_question() {
        QUESTION_INSTRUCTIONS
    } else {
        ""
    };

    let vars = TemplateVars::new()
        .with("event", race.event)
        .with("age", athlete.age)
        .with("max_hr", athlete.max_hr)
        .with("lthr", athlete.lthr)
        .with("weight", athlete.weight)
        .with("race_date", race.date)
        .with("target", race.target_time.as_deref().unwrap_or("Complete the race"))
        .with("week_number", snapshot.week_number)
        .with("total_weeks", snapshot.total_weeks)
        .with("phase", phase(snapshot.week_number, weeks_to_race))
        .with("today", snapshot.today)
        .with("weekday", snapshot.today.format("%A"))
        .with("weeks_to_race", weeks_to_race.max(0))
        .with("ctl", format!("{:.1}", wellness.ctl()))
        .with("atl", format!("{:.1}", wellness.atl()))
        .with("tsb", format!("{:.1}", wellness.tsb()))
        .with("wellness_extras", extras)
        .with("z1", zones.recovery)
        .with("z2", zones.aerobic)
        .with("z3", zones.tempo)
        .with("z4", zones.threshold)
        .with("technique_cue", technique_cue(snapshot.week_number))
        .with("athlete_state", athlete_state)
        .with("question_instructions", question_instructions);

    PromptTemplate::parse(SYSTEM_TEMPLATE)?.render(&vars)
}
