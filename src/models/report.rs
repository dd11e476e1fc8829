use crate::models::metrics::WeeklyMetrics;
use crate::models::period::WeekRange;
use crate::models::streak::StreakResult;
use crate::models::targets::TargetEvaluation;
use crate::models::verdict::{Trend, Verdict};
use serde::{Deserialize, Serialize};

/// Where a weekly report's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// In-progress week computed from upstream activity; never persisted.
    Live,
    /// Past week computed from upstream activity and written as a snapshot.
    Computed,
    /// Past week replayed from an existing snapshot.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub week_range: WeekRange,
    pub repo_scope: String,
    pub repositories: Vec<String>,
    pub metrics: WeeklyMetrics,
    pub verdict: Verdict,
    pub trend: Trend,
    pub targets: TargetEvaluation,
    pub qualified: bool,
    pub streak: StreakResult,
    pub source: ReportSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub fork: bool,
}
