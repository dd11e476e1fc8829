use crate::models::composition::{Category, CompositionResult};
use crate::models::metrics::MonthlyMetrics;

/// Weighted delivery / stability / quality split of a month's effort.
pub fn calculate_composition(metrics: &MonthlyMetrics) -> CompositionResult {
    let delivery = f64::from(metrics.activity.pr_merged) * 3.0
        + f64::from(metrics.activity.features_completed) * 5.0
        + f64::from(metrics.activity.commits);
    let stability =
        f64::from(metrics.combat.bugs_fixed) * 3.0 + f64::from(metrics.combat.bugs_found);
    let quality =
        f64::from(metrics.defense.tests_written) * 2.0 + f64::from(metrics.defense.ci_runs);

    let total = delivery + stability + quality;
    if total == 0.0 {
        return CompositionResult {
            delivery_percent: 0.0,
            stability_percent: 0.0,
            quality_percent: 0.0,
            dominant_category: Category::Delivery,
        };
    }

    let delivery_percent = delivery / total * 100.0;
    let stability_percent = stability / total * 100.0;
    let quality_percent = quality / total * 100.0;

    // Ties resolve in DELIVERY > STABILITY > QUALITY order.
    let dominant_category =
        if delivery_percent >= stability_percent && delivery_percent >= quality_percent {
            Category::Delivery
        } else if stability_percent >= delivery_percent && stability_percent >= quality_percent {
            Category::Stability
        } else {
            Category::Quality
        };

    CompositionResult {
        delivery_percent: round_one_decimal(delivery_percent),
        stability_percent: round_one_decimal(stability_percent),
        quality_percent: round_one_decimal(quality_percent),
        dominant_category,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
