use crate::models::composition::CompositionResult;
use crate::models::metrics::MonthlyMetrics;
use crate::models::period::MonthId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonthlyVerdict {
    StrongMonth,
    SolidMonth,
    UnstableMonth,
    ChaoticMonth,
}

impl MonthlyVerdict {
    pub fn from_ratio(qualified_ratio: f64) -> Self {
        if qualified_ratio >= 1.0 {
            Self::StrongMonth
        } else if qualified_ratio >= 0.75 {
            Self::SolidMonth
        } else if qualified_ratio >= 0.25 {
            Self::UnstableMonth
        } else {
            Self::ChaoticMonth
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Self::StrongMonth => "STRONG",
            Self::SolidMonth => "SOLID",
            Self::UnstableMonth => "UNSTABLE",
            Self::ChaoticMonth => "CHAOTIC",
        }
    }
}

/// Snapshots of one month folded together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub metrics: MonthlyMetrics,
    pub qualified_weeks: u32,
    pub total_weeks: u32,
    pub verdict: MonthlyVerdict,
    pub end_of_month_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month: MonthId,
    #[serde(flatten)]
    pub summary: MonthlySummary,
    pub composition: CompositionResult,
}
