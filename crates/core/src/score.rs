use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GreenScore, GreenScoreComponents, GreenScoreMetrics, TimeRange, round_to};

pub const BYTES_PER_TB: f64 = 1_099_511_627_776.0;
/// Partitioned-scan share assumed for records that do not report one.
pub const DEFAULT_PARTITIONED_SCAN_PCT: f64 = 0.5;

const PARTITION_KEY: &str = "partitionedScanPct";

/// Blend of the three green-score components. Weights are expected to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub efficiency_weight: f64,
    pub partitioning_weight: f64,
    pub freshness_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            efficiency_weight: 0.5,
            partitioning_weight: 0.3,
            freshness_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTargets {
    pub kg_per_tb: f64,
    pub freshness_hours: f64,
}

impl Default for ScoreTargets {
    fn default() -> Self {
        Self {
            kg_per_tb: 5.0,
            freshness_hours: 24.0,
        }
    }
}

/// Window aggregates the score is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreInputs {
    pub co2e_kg: f64,
    pub bytes_io: u64,
    /// Mean partitioned-scan share over the window, `None` for an empty window.
    pub partitioned_scan_avg: Option<f64>,
    /// Latest end timestamp across all history.
    pub last_ended_at: Option<DateTime<Utc>>,
}

pub fn kg_per_tb(co2e_kg: f64, bytes_io: u64) -> f64 {
    let tb = bytes_io as f64 / BYTES_PER_TB;
    if tb > 0.0 { co2e_kg / tb } else { 0.0 }
}

/// 100 at or under target, `100 * target / actual` above it.
pub fn efficiency_score(actual_kg_per_tb: f64, target_kg_per_tb: f64) -> f64 {
    if actual_kg_per_tb <= 0.0 || target_kg_per_tb <= 0.0 || actual_kg_per_tb <= target_kg_per_tb
    {
        return 100.0;
    }
    (100.0 * (target_kg_per_tb / actual_kg_per_tb)).clamp(0.0, 100.0)
}

/// Zero without any completed record, otherwise decays past the target age.
pub fn freshness_score(age_hours: Option<f64>, target_hours: f64) -> f64 {
    let Some(age_hours) = age_hours else {
        return 0.0;
    };
    if age_hours <= target_hours {
        return 100.0;
    }
    if target_hours <= 0.0 {
        return 0.0;
    }
    (100.0 * (target_hours / age_hours)).clamp(0.0, 100.0)
}

pub fn partitioning_score(partitioned_scan_avg: Option<f64>) -> f64 {
    (partitioned_scan_avg.unwrap_or(DEFAULT_PARTITIONED_SCAN_PCT) * 100.0).clamp(0.0, 100.0)
}

/// Partitioned-scan share carried in a raw payload, at the top level or
/// under `labels`. Numeric strings are accepted since labels are free-form.
pub fn partitioned_scan_fraction(raw: &Value) -> f64 {
    raw.get(PARTITION_KEY)
        .or_else(|| raw.get("labels").and_then(|labels| labels.get(PARTITION_KEY)))
        .and_then(value_to_f64)
        .unwrap_or(DEFAULT_PARTITIONED_SCAN_PCT)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn mean_partitioned_scan<'a>(raws: impl IntoIterator<Item = &'a Value>) -> Option<f64> {
    let (sum, count) = raws
        .into_iter()
        .fold((0.0, 0u64), |(sum, count), raw| {
            (sum + partitioned_scan_fraction(raw), count + 1)
        });
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub fn green_score(
    range: TimeRange,
    inputs: ScoreInputs,
    targets: ScoreTargets,
    weights: ScoreWeights,
    now: DateTime<Utc>,
) -> GreenScore {
    let actual_kg_per_tb = kg_per_tb(inputs.co2e_kg, inputs.bytes_io);
    let efficiency = efficiency_score(actual_kg_per_tb, targets.kg_per_tb);
    let age_hours = inputs
        .last_ended_at
        .map(|ended| (now - ended).num_milliseconds() as f64 / 3_600_000.0);
    let freshness = freshness_score(age_hours, targets.freshness_hours);
    let partitioning = partitioning_score(inputs.partitioned_scan_avg);
    let overall = efficiency * weights.efficiency_weight
        + partitioning * weights.partitioning_weight
        + freshness * weights.freshness_weight;

    GreenScore {
        range,
        metrics: GreenScoreMetrics {
            co2e_kg: inputs.co2e_kg,
            bytes_io: inputs.bytes_io,
            tb_processed: inputs.bytes_io as f64 / BYTES_PER_TB,
            kg_per_tb: actual_kg_per_tb,
            last_ended_at: inputs.last_ended_at,
        },
        components: GreenScoreComponents {
            efficiency: round_to(efficiency, 2),
            partitioning: round_to(partitioning, 2),
            freshness: round_to(freshness, 2),
        },
        overall: round_to(overall, 2),
    }
}
