use crate::commands::db::SnapshotStore;
use crate::models::period::WEEK_FORMAT;
use crate::models::snapshot::WeeklySnapshot;
use crate::models::streak::{StreakResult, StreakStatus};

pub const DEFAULT_LOOKBACK_WEEKS: u32 = 12;

/// Consecutive qualifying weeks ending at the most recent persisted week.
///
/// History retrieval is best-effort: a failing store yields the zero/BROKEN result.
pub fn calculate_streak(
    store: &dyn SnapshotStore,
    github_user_id: &str,
    repo_scope: &str,
    max_weeks: u32,
) -> StreakResult {
    match store.list_recent(github_user_id, repo_scope, max_weeks) {
        Ok(history) => streak_from_history(&history),
        Err(e) => {
            log::warn!("Streak history unavailable for {github_user_id}/{repo_scope}: {e}");
            StreakResult::default()
        }
    }
}

/// Walk snapshots ordered newest-first, stopping at the first week that did not qualify.
pub fn streak_from_history(newest_first: &[WeeklySnapshot]) -> StreakResult {
    let mut streak = 0;
    let mut last_qualified_week = String::new();

    for snapshot in newest_first {
        if !snapshot.qualified {
            break;
        }
        if last_qualified_week.is_empty() {
            last_qualified_week = snapshot.week_start.format(WEEK_FORMAT).to_string();
        }
        streak += 1;
    }

    let newest_qualifies = newest_first.first().is_some_and(|s| s.qualified);
    let current_streak = if newest_qualifies { streak } else { 0 };

    StreakResult {
        current_streak,
        last_qualified_week,
        status: if newest_qualifies {
            StreakStatus::Active
        } else {
            StreakStatus::Broken
        },
        previous_streak: current_streak,
    }
}
