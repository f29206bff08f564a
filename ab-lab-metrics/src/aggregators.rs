use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ab_lab_core::{GroupLabel, Sample};

/// Descriptive summary of one group's metric values: the counterpart of the
/// per-column summaries the report is usually read alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: GroupLabel,
    pub count: usize,
    pub mean: Decimal,
    pub median: Decimal,
    pub std_dev: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub q01: Decimal,
    pub q05: Decimal,
    pub q10: Decimal,
    pub q50: Decimal,
    pub q90: Decimal,
    pub q95: Decimal,
    pub q99: Decimal,
}

impl GroupSummary {
    pub fn aggregate(sample: &Sample) -> GroupSummary {
        let mut sorted = sample.values().to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        GroupSummary {
            group: sample.label(),
            count: sample.len(),
            mean: to_decimal(sample.mean()),
            median: to_decimal(sample.median()),
            std_dev: to_decimal(sample.std_dev()),
            min: to_decimal(sorted[0]),
            max: to_decimal(sorted[sorted.len() - 1]),
            q01: to_decimal(percentile(&sorted, 1.0)),
            q05: to_decimal(percentile(&sorted, 5.0)),
            q10: to_decimal(percentile(&sorted, 10.0)),
            q50: to_decimal(percentile(&sorted, 50.0)),
            q90: to_decimal(percentile(&sorted, 90.0)),
            q95: to_decimal(percentile(&sorted, 95.0)),
            q99: to_decimal(percentile(&sorted, 99.0)),
        }
    }
}

// Linear interpolation between order statistics, so quantiles agree with the
// usual `describe`-style summaries rather than snapping to the nearest rank.
fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    let rank = percentile / 100.0 * (sorted_values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(sorted_values.len() - 1);
    if lower == upper {
        return sorted_values[lower];
    }
    let weight = rank - lower as f64;
    sorted_values[lower] + weight * (sorted_values[upper] - sorted_values[lower])
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}
