use serde::{Deserialize, Serialize};

/// Weekly thresholds. Passed into the target engine rather than read from a global.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTargets {
    pub pr_merged: u32,
    pub features_completed: u32,
    pub bug_fix_ratio: f64,
    pub tests_written: u32,
    /// Completion rate at or above which a week is ON_TRACK.
    #[serde(default = "default_on_track_threshold")]
    pub on_track_threshold: f64,
}

fn default_on_track_threshold() -> f64 {
    0.75
}

impl Default for WeeklyTargets {
    fn default() -> Self {
        Self {
            pr_merged: 3,
            features_completed: 1,
            bug_fix_ratio: 1.0,
            tests_written: 5,
            on_track_threshold: default_on_track_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetCheck<T> {
    pub current: T,
    pub target: T,
    pub met: bool,
}

impl<T: PartialOrd + Copy> TargetCheck<T> {
    pub fn new(current: T, target: T) -> Self {
        Self {
            current,
            target,
            met: current >= target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    OnTrack,
    AtRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEvaluation {
    pub pr_merged: TargetCheck<u32>,
    pub features_completed: TargetCheck<u32>,
    pub bug_fix_ratio: TargetCheck<f64>,
    pub tests_written: TargetCheck<u32>,
    pub completion_rate: f64,
    pub overall_status: OverallStatus,
}

impl TargetEvaluation {
    pub fn met_count(&self) -> usize {
        [
            self.pr_merged.met,
            self.features_completed.met,
            self.bug_fix_ratio.met,
            self.tests_written.met,
        ]
        .into_iter()
        .filter(|met| *met)
        .count()
    }
}
