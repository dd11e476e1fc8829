use crate::models::metrics::WeeklyMetrics;
use crate::models::verdict::{Trend, TrendDirection, Verdict, VerdictLabel};

/// Number of most recent verdicts considered by [`calculate_trend`].
pub const TREND_WINDOW: usize = 3;

/// Score a week. `previous` only feeds the open-bug growth penalty.
pub fn calculate_verdict(metrics: &WeeklyMetrics, previous: Option<&WeeklyMetrics>) -> Verdict {
    let mut score = 0;

    if metrics.activity.pr_merged >= 1 {
        score += 1;
    }
    if metrics.activity.features_completed >= 1 {
        score += 1;
    }
    if metrics.combat.bug_fix_ratio >= 1.0 {
        score += 1;
    }
    if metrics.defense.tests_written >= 5 {
        score += 1;
    }

    if metrics.combat.bug_fix_ratio < 1.0 {
        score -= 1;
    }
    if let Some(previous) = previous {
        if metrics.combat.open_bugs > previous.combat.open_bugs {
            score -= 1;
        }
    }

    Verdict {
        score,
        label: VerdictLabel::from_score(score),
    }
}

/// Direction of the last few verdicts, ordered oldest to newest.
pub fn calculate_trend(labels: &[VerdictLabel]) -> Trend {
    if labels.len() < 2 {
        return TrendDirection::InsufficientData.into();
    }

    let recent = &labels[labels.len().saturating_sub(TREND_WINDOW)..];
    let (mut improving, mut declining) = (0, 0);
    for pair in recent.windows(2) {
        let (before, after) = (pair[0].weight(), pair[1].weight());
        if after > before {
            improving += 1;
        } else if after < before {
            declining += 1;
        }
    }

    let direction = if improving > declining {
        TrendDirection::Improving
    } else if declining > improving {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    direction.into()
}
