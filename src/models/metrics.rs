use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetrics {
    pub commits: u32,
    pub pr_opened: u32,
    pub pr_merged: u32,
    pub features_completed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatMetrics {
    pub bugs_found: u32,
    pub bugs_fixed: u32,
    pub open_bugs: u32,
    pub bug_fix_ratio: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseMetrics {
    pub tests_written: u32,
    pub ci_runs: u32,
}

/// One week of activity for a repository set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMetrics {
    pub activity: ActivityMetrics,
    pub combat: CombatMetrics,
    pub defense: DefenseMetrics,
}

/// Same shape as a week; `combat.open_bugs` is a gauge taken from the last week.
pub type MonthlyMetrics = WeeklyMetrics;

/// Raw per-repository counts as supplied by the GitHub collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepoWeekCounts {
    pub commits: u32,
    pub pr_opened: u32,
    pub pr_merged: u32,
    pub features_completed: u32,
    pub bugs_found: u32,
    pub bugs_fixed: u32,
    pub open_bugs: u32,
    pub tests_written: u32,
    pub ci_runs: u32,
}

/// Fixed-by / found ratio. Fixing bugs when none were reported counts as fully resolved.
pub fn bug_fix_ratio(bugs_found: u32, bugs_fixed: u32) -> f64 {
    if bugs_found > 0 {
        bugs_fixed as f64 / bugs_found as f64
    } else if bugs_fixed > 0 {
        1.0
    } else {
        0.0
    }
}

impl WeeklyMetrics {
    /// Build a week from raw counts, deriving the bug fix ratio.
    pub fn from_counts(counts: RepoWeekCounts) -> Self {
        Self {
            activity: ActivityMetrics {
                commits: counts.commits,
                pr_opened: counts.pr_opened,
                pr_merged: counts.pr_merged,
                features_completed: counts.features_completed,
            },
            combat: CombatMetrics {
                bugs_found: counts.bugs_found,
                bugs_fixed: counts.bugs_fixed,
                open_bugs: counts.open_bugs,
                bug_fix_ratio: bug_fix_ratio(counts.bugs_found, counts.bugs_fixed),
            },
            defense: DefenseMetrics {
                tests_written: counts.tests_written,
                ci_runs: counts.ci_runs,
            },
        }
    }

    /// Sum several repositories' counts into one week. Open bugs add up across repositories.
    pub fn aggregate<'a, I>(per_repo: I) -> Self
    where
        I: IntoIterator<Item = &'a RepoWeekCounts>,
    {
        let mut total = RepoWeekCounts::default();
        for counts in per_repo {
            total.commits = total.commits.saturating_add(counts.commits);
            total.pr_opened = total.pr_opened.saturating_add(counts.pr_opened);
            total.pr_merged = total.pr_merged.saturating_add(counts.pr_merged);
            total.features_completed = total.features_completed.saturating_add(counts.features_completed);
            total.bugs_found = total.bugs_found.saturating_add(counts.bugs_found);
            total.bugs_fixed = total.bugs_fixed.saturating_add(counts.bugs_fixed);
            total.open_bugs = total.open_bugs.saturating_add(counts.open_bugs);
            total.tests_written = total.tests_written.saturating_add(counts.tests_written);
            total.ci_runs = total.ci_runs.saturating_add(counts.ci_runs);
        }
        Self::from_counts(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_zero_without_any_bug_activity() {
        assert_eq!(bug_fix_ratio(0, 0), 0.0);
    }

    #[test]
    fn ratio_is_one_when_fixing_without_new_reports() {
        assert_eq!(bug_fix_ratio(0, 3), 1.0);
        assert_eq!(bug_fix_ratio(5, 5), 1.0);
        assert!((bug_fix_ratio(4, 1) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn aggregate_sums_repositories_and_derives_ratio() {
        let a = RepoWeekCounts {
            commits: 4,
            pr_merged: 1,
            bugs_found: 2,
            bugs_fixed: 1,
            open_bugs: 3,
            ..Default::default()
        };
        let b = RepoWeekCounts {
            commits: 6,
            pr_merged: 2,
            bugs_found: 2,
            bugs_fixed: 3,
            open_bugs: 1,
            tests_written: 5,
            ..Default::default()
        };

        let week = WeeklyMetrics::aggregate([&a, &b]);
        assert_eq!(week.activity.commits, 10);
        assert_eq!(week.activity.pr_merged, 3);
        assert_eq!(week.combat.open_bugs, 4);
        assert_eq!(week.defense.tests_written, 5);
        assert_eq!(week.combat.bug_fix_ratio, 1.0);
    }

    #[test]
    fn aggregate_saturates_instead_of_overflowing() {
        let huge = RepoWeekCounts {
            commits: u32::MAX - 1,
            ci_runs: 7,
            ..Default::default()
        };
        let week = WeeklyMetrics::aggregate([&huge, &huge]);
        assert_eq!(week.activity.commits, u32::MAX);
        assert_eq!(week.defense.ci_runs, 14);
    }

    #[test]
    fn serializes_with_front_end_field_names() {
        let value = serde_json::to_value(WeeklyMetrics::default()).unwrap();
        assert!(value["activity"].get("prMerged").is_some());
        assert!(value["combat"].get("bugFixRatio").is_some());
        assert!(value["defense"].get("ciRuns").is_some());
    }
}
