//! Athlete physiology, fitness metrics, activities, and race goals.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Static physiology of the athlete.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteProfile {
    /// Age in whole years.
    pub age: u32,
    /// Maximum heart rate in bpm.
    pub max_hr: u32,
    /// Lactate-threshold heart rate in bpm.
    pub lthr: u32,
    /// Body weight in kilograms.
    pub weight: f64,
}

/// Chronic/acute load metrics for a given day.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wellness {
    ctl: f64,
    atl: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resting_hr: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
}

impl Wellness {
    /// Creates metrics from chronic (fitness) and acute (fatigue) load.
    #[must_use]
    pub const fn new(ctl: f64, atl: f64) -> Self {
        Self {
            ctl,
            atl,
            resting_hr: None,
            weight: None,
        }
    }

    /// Attaches the resting heart rate.
    #[must_use]
    pub const fn with_resting_hr(mut self, resting_hr: u32) -> Self {
        self.resting_hr = Some(resting_hr);
        self
    }

    /// Attaches the measured body weight.
    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Chronic training load (fitness).
    #[must_use]
    pub const fn ctl(&self) -> f64 {
        self.ctl
    }

    /// Acute training load (fatigue).
    #[must_use]
    pub const fn atl(&self) -> f64 {
        self.atl
    }

    /// Training stress balance, always `ctl - atl`.
    #[must_use]
    pub fn tsb(&self) -> f64 {
        self.ctl - self.atl
    }

    /// Resting heart rate, when recorded.
    #[must_use]
    pub const fn resting_hr(&self) -> Option<u32> {
        self.resting_hr
    }

    /// Body weight, when recorded.
    #[must_use]
    pub const fn weight(&self) -> Option<f64> {
        self.weight
    }
}

/// Activity categories retained for coaching context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    /// Any running activity.
    Run,
    /// Road, gravel, or indoor cycling.
    Ride,
    /// Gym and strength work.
    WeightTraining,
    /// Anything else.
    Other,
}

impl ActivityKind {
    /// Classifies an upstream activity type string such as `VirtualRide`.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("run") {
            Self::Run
        } else if lower.contains("ride") || lower.contains("cycling") {
            Self::Ride
        } else if lower.contains("weight") {
            Self::WeightTraining
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Run => "Run",
            Self::Ride => "Ride",
            Self::WeightTraining => "WeightTraining",
            Self::Other => "Other",
        })
    }
}

/// Condensed activity record used as model context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactActivity {
    /// Local calendar date of the activity.
    pub date: NaiveDate,
    /// Activity category.
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Moving time in whole minutes.
    pub duration_min: u32,
    /// Distance in kilometres, rounded to two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Average heart rate in bpm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<u32>,
    /// Training load (TSS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    /// Subjective feel, 1-5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feel: Option<u8>,
    /// Perceived effort, 1-10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<u8>,
    /// Interval summary lines, e.g. `2x 14m 113bpm`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intervals: Vec<String>,
    /// Free-text description written by the athlete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompactActivity {
    /// Creates an activity with only the mandatory fields populated.
    #[must_use]
    pub fn new(date: NaiveDate, kind: ActivityKind, duration_min: u32) -> Self {
        Self {
            date,
            kind,
            duration_min,
            distance_km: None,
            avg_hr: None,
            load: None,
            feel: None,
            rpe: None,
            intervals: Vec::new(),
            notes: None,
        }
    }
}

/// Supported race distances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceEvent {
    /// 5 kilometres.
    #[serde(rename = "5K")]
    FiveK,
    /// 10 kilometres.
    #[serde(rename = "10K")]
    TenK,
    /// 21.1 kilometres.
    HalfMarathon,
    /// 42.2 kilometres.
    Marathon,
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FiveK => "5K",
            Self::TenK => "10K",
            Self::HalfMarathon => "HalfMarathon",
            Self::Marathon => "Marathon",
        })
    }
}

impl FromStr for RaceEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "5k" => Ok(Self::FiveK),
            "10k" => Ok(Self::TenK),
            "halfmarathon" | "half" => Ok(Self::HalfMarathon),
            "marathon" => Ok(Self::Marathon),
            _ => Err(Error::variant("race event", s)),
        }
    }
}

/// Target race for the current training block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceGoal {
    /// Race day.
    pub date: NaiveDate,
    /// Race distance.
    pub event: RaceEvent,
    /// Target finishing time, free form (e.g. `1:45:00`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
}
