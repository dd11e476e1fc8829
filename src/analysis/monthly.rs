use crate::models::metrics::{bug_fix_ratio, MonthlyMetrics};
use crate::models::monthly::{MonthlySummary, MonthlyVerdict};
use crate::models::snapshot::WeeklySnapshot;

/// Fold a month's snapshots, ordered oldest-first, into one summary.
///
/// Returns `None` for an empty month so callers report "no data" instead of zeros.
pub fn summarize_month(oldest_first: &[WeeklySnapshot]) -> Option<MonthlySummary> {
    let last = oldest_first.last()?;

    let mut metrics = MonthlyMetrics::default();
    for snapshot in oldest_first {
        let week = &snapshot.metrics;
        metrics.activity.commits = metrics.activity.commits.saturating_add(week.activity.commits);
        metrics.activity.pr_opened = metrics.activity.pr_opened.saturating_add(week.activity.pr_opened);
        metrics.activity.pr_merged = metrics.activity.pr_merged.saturating_add(week.activity.pr_merged);
        metrics.activity.features_completed = metrics.activity.features_completed.saturating_add(week.activity.features_completed);
        metrics.combat.bugs_found = metrics.combat.bugs_found.saturating_add(week.combat.bugs_found);
        metrics.combat.bugs_fixed = metrics.combat.bugs_fixed.saturating_add(week.combat.bugs_fixed);
        metrics.defense.tests_written = metrics.defense.tests_written.saturating_add(week.defense.tests_written);
        metrics.defense.ci_runs = metrics.defense.ci_runs.saturating_add(week.defense.ci_runs);
    }
    // Open bugs is a gauge: keep the latest reading instead of summing.
    metrics.combat.open_bugs = last.metrics.combat.open_bugs;
    metrics.combat.bug_fix_ratio = bug_fix_ratio(metrics.combat.bugs_found, metrics.combat.bugs_fixed);

    let total_weeks = oldest_first.len() as u32;
    let qualified_weeks = oldest_first.iter().filter(|s| s.qualified).count() as u32;
    let verdict = MonthlyVerdict::from_ratio(f64::from(qualified_weeks) / f64::from(total_weeks));

    Some(MonthlySummary {
        metrics,
        qualified_weeks,
        total_weeks,
        verdict,
        end_of_month_streak: end_of_month_streak(oldest_first),
    })
}

/// Qualifying weeks counted backwards from the month's final snapshot.
pub fn end_of_month_streak(oldest_first: &[WeeklySnapshot]) -> u32 {
    oldest_first
        .iter()
        .rev()
        .take_while(|s| s.qualified)
        .count() as u32
}
