use crate::models::metrics::WeeklyMetrics;
use crate::models::targets::{OverallStatus, TargetCheck, TargetEvaluation, WeeklyTargets};

const TARGET_COUNT: f64 = 4.0;

/// Compare a week against the configured thresholds.
pub fn evaluate_targets(metrics: &WeeklyMetrics, targets: &WeeklyTargets) -> TargetEvaluation {
    let pr_merged = TargetCheck::new(metrics.activity.pr_merged, targets.pr_merged);
    let features_completed =
        TargetCheck::new(metrics.activity.features_completed, targets.features_completed);
    let bug_fix_ratio = TargetCheck::new(metrics.combat.bug_fix_ratio, targets.bug_fix_ratio);
    let tests_written = TargetCheck::new(metrics.defense.tests_written, targets.tests_written);

    let met = [
        pr_merged.met,
        features_completed.met,
        bug_fix_ratio.met,
        tests_written.met,
    ]
    .into_iter()
    .filter(|met| *met)
    .count();
    let completion_rate = met as f64 / TARGET_COUNT;

    let overall_status = if completion_rate >= targets.on_track_threshold {
        OverallStatus::OnTrack
    } else {
        OverallStatus::AtRisk
    };

    TargetEvaluation {
        pr_merged,
        features_completed,
        bug_fix_ratio,
        tests_written,
        completion_rate,
        overall_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pr_merged: u32, features: u32, ratio: f64, tests: u32) -> WeeklyMetrics {
        let mut m = WeeklyMetrics::default();
        m.activity.pr_merged = pr_merged;
        m.activity.features_completed = features;
        m.combat.bug_fix_ratio = ratio;
        m.defense.tests_written = tests;
        m
    }

    #[test]
    fn all_targets_met_is_on_track() {
        let eval = evaluate_targets(&metrics(3, 1, 1.0, 5), &WeeklyTargets::default());
        assert_eq!(eval.completion_rate, 1.0);
        assert_eq!(eval.overall_status, OverallStatus::OnTrack);
        assert_eq!(eval.met_count(), 4);
    }

    #[test]
    fn three_of_four_is_still_on_track() {
        let eval = evaluate_targets(&metrics(3, 1, 0.5, 5), &WeeklyTargets::default());
        assert_eq!(eval.completion_rate, 0.75);
        assert!(!eval.bug_fix_ratio.met);
        assert_eq!(eval.overall_status, OverallStatus::OnTrack);
    }

    #[test]
    fn half_met_is_at_risk() {
        let eval = evaluate_targets(&metrics(2, 1, 1.0, 4), &WeeklyTargets::default());
        assert_eq!(eval.completion_rate, 0.5);
        assert_eq!(eval.pr_merged.current, 2);
        assert_eq!(eval.pr_merged.target, 3);
        assert_eq!(eval.overall_status, OverallStatus::AtRisk);
    }

    #[test]
    fn injected_thresholds_replace_the_defaults() {
        let lenient = WeeklyTargets {
            pr_merged: 1,
            features_completed: 0,
            bug_fix_ratio: 0.0,
            tests_written: 1,
            on_track_threshold: 0.75,
        };
        let eval = evaluate_targets(&metrics(1, 0, 0.0, 1), &lenient);
        assert_eq!(eval.met_count(), 4);
        assert_eq!(eval.overall_status, OverallStatus::OnTrack);
    }

    #[test]
    fn serializes_per_target_checks() {
        let eval = evaluate_targets(&metrics(3, 1, 1.0, 5), &WeeklyTargets::default());
        let value = serde_json::to_value(eval).unwrap();
        assert_eq!(value["prMerged"]["target"], 3);
        assert_eq!(value["testsWritten"]["met"], true);
        assert_eq!(value["overallStatus"], "ON_TRACK");
        assert_eq!(value["completionRate"], 1.0);
    }
}
