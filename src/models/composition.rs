use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Delivery,
    Stability,
    Quality,
}

impl Category {
    pub fn narrative(self) -> &'static str {
        match self {
            Self::Delivery => "Focus this month was on delivering features and merging pull requests.",
            Self::Stability => "Focus this month was on fixing bugs and maintaining system stability.",
            Self::Quality => "Focus this month was on writing tests and improving code quality.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResult {
    pub delivery_percent: f64,
    pub stability_percent: f64,
    pub quality_percent: f64,
    pub dominant_category: Category,
}

impl CompositionResult {
    pub fn is_empty(&self) -> bool {
        self.delivery_percent == 0.0 && self.stability_percent == 0.0 && self.quality_percent == 0.0
    }

    pub fn narrative(&self) -> &'static str {
        if self.is_empty() {
            "Balanced effort across all development areas."
        } else {
            self.dominant_category.narrative()
        }
    }
}
