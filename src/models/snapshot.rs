use crate::models::metrics::WeeklyMetrics;
use crate::models::targets::{OverallStatus, TargetEvaluation};
use crate::models::verdict::{Verdict, VerdictLabel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Key of a persisted week: one row per (user, week, scope).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub github_user_id: String,
    pub week_start: NaiveDate,
    pub repo_scope: String,
}

impl SnapshotKey {
    pub fn new(github_user_id: impl Into<String>, week_start: NaiveDate, repo_scope: impl Into<String>) -> Self {
        Self {
            github_user_id: github_user_id.into(),
            week_start,
            repo_scope: repo_scope.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySnapshot {
    pub id: String,
    pub github_user_id: String,
    pub week_start: NaiveDate,
    pub repo_scope: String,
    pub metrics: WeeklyMetrics,
    pub verdict: Verdict,
    pub targets: TargetEvaluation,
    pub qualified: bool,
    pub created_at: i64,
}

/// Everything a new snapshot carries besides its identity and timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotContent {
    pub metrics: WeeklyMetrics,
    pub verdict: Verdict,
    pub targets: TargetEvaluation,
    pub qualified: bool,
}

impl SnapshotContent {
    /// `qualified` is fixed here, at creation time, and never recomputed downstream.
    pub fn evaluate(metrics: WeeklyMetrics, verdict: Verdict, targets: TargetEvaluation) -> Self {
        Self {
            metrics,
            verdict,
            targets,
            qualified: is_qualifying(&verdict, &targets),
        }
    }
}

/// A week qualifies when its verdict is not CHAOTIC and its targets are ON_TRACK.
pub fn is_qualifying(verdict: &Verdict, targets: &TargetEvaluation) -> bool {
    verdict.label != VerdictLabel::Chaotic && targets.overall_status == OverallStatus::OnTrack
}

/// Versioned document stored in the `payload_json` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum SnapshotPayload {
    #[serde(rename = "v1")]
    V1 {
        metrics: WeeklyMetrics,
        verdict: Verdict,
        targets: TargetEvaluation,
    },
}

impl SnapshotPayload {
    pub fn current(metrics: WeeklyMetrics, verdict: Verdict, targets: TargetEvaluation) -> Self {
        Self::V1 {
            metrics,
            verdict,
            targets,
        }
    }

    /// Reject payloads that deserialize but cannot have been produced by the engines.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::V1 {
                metrics,
                verdict,
                targets,
            } => {
                if VerdictLabel::from_score(verdict.score) != verdict.label {
                    return Err(format!(
                        "verdict label {} does not match score {}",
                        verdict.label.as_str(),
                        verdict.score
                    ));
                }
                if !metrics.combat.bug_fix_ratio.is_finite() || metrics.combat.bug_fix_ratio < 0.0 {
                    return Err("bug fix ratio is not a non-negative number".to_string());
                }
                if !(0.0..=1.0).contains(&targets.completion_rate) {
                    return Err(format!("completion rate {} out of range", targets.completion_rate));
                }
                Ok(())
            }
        }
    }

    pub fn into_parts(self) -> (WeeklyMetrics, Verdict, TargetEvaluation) {
        match self {
            Self::V1 {
                metrics,
                verdict,
                targets,
            } => (metrics, verdict, targets),
        }
    }
}
