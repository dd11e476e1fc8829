use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreakStatus {
    Active,
    Broken,
}

/// `previous_streak` mirrors `current_streak`; it is not the length of the run that just ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResult {
    pub current_streak: u32,
    pub last_qualified_week: String,
    pub status: StreakStatus,
    pub previous_streak: u32,
}

impl Default for StreakResult {
    fn default() -> Self {
        Self {
            current_streak: 0,
            last_qualified_week: String::new(),
            status: StreakStatus::Broken,
            previous_streak: 0,
        }
    }
}

impl StreakResult {
    pub fn status_line(&self) -> String {
        match self.status {
            StreakStatus::Active => format!("Performance Streak: {} Weeks", self.current_streak),
            StreakStatus::Broken => {
                format!("Streak Broken - Last Streak: {} Weeks", self.previous_streak)
            }
        }
    }
}
