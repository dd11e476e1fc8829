use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictLabel {
    Strong,
    Solid,
    Chaotic,
}

impl VerdictLabel {
    /// Score ≥ 3 is STRONG, 1 or 2 is SOLID, anything else is CHAOTIC.
    pub fn from_score(score: i32) -> Self {
        if score >= 3 {
            Self::Strong
        } else if score == 1 || score == 2 {
            Self::Solid
        } else {
            Self::Chaotic
        }
    }

    /// Ordinal used by trend detection.
    pub fn weight(self) -> u8 {
        match self {
            Self::Strong => 3,
            Self::Solid => 2,
            Self::Chaotic => 1,
        }
    }

    pub fn helper_text(self) -> &'static str {
        match self {
            Self::Strong => "Momentum maintained.",
            Self::Solid => "Stable progress.",
            Self::Chaotic => "Stability needs attention.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "STRONG",
            Self::Solid => "SOLID",
            Self::Chaotic => "CHAOTIC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub score: i32,
    pub label: VerdictLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    #[serde(rename = "Insufficient data")]
    InsufficientData,
}

impl TrendDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Improving => "↑",
            Self::Stable => "→",
            Self::Declining => "↓",
            Self::InsufficientData => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub trend: TrendDirection,
    pub arrow: String,
}

impl From<TrendDirection> for Trend {
    fn from(trend: TrendDirection) -> Self {
        Self {
            trend,
            arrow: trend.arrow().to_string(),
        }
    }
}
