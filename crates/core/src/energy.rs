use std::collections::HashMap;

use crate::{UsageRecord, round6};

/// CPU utilization assumed when the collector reports none.
pub const DEFAULT_CPU_UTILIZATION_PCT: f64 = 55.0;
/// Shortest duration the estimator will bill, in hours.
pub const MIN_DURATION_HOURS: f64 = 0.01;
/// Power draw for unknown compute shapes: 8 vCPU at 15 W each.
pub const DEFAULT_NODE_WATTS: f64 = 8.0 * 15.0;

/// Approximate per-node power draw under load, in watts.
const BUILTIN_SHAPES: &[(&str, f64)] = &[
    ("Standard_D8_v5", 200.0),
    ("Standard_E8_v5", 240.0),
    ("Standard_NC4as_T4_v3", 350.0),
    ("Standard_NC6s_v3", 600.0),
];

pub trait PowerDrawLookup {
    fn watts(&self, compute_type: &str) -> Option<f64>;
}

#[derive(Debug, Clone)]
pub struct PowerTable {
    watts: HashMap<String, f64>,
}

impl PowerTable {
    pub fn empty() -> Self {
        Self {
            watts: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        BUILTIN_SHAPES
            .iter()
            .fold(Self::empty(), |table, (shape, watts)| {
                table.with_shape(shape, *watts)
            })
    }

    pub fn with_shape(mut self, compute_type: &str, watts: f64) -> Self {
        self.watts.insert(compute_type.to_string(), watts);
        self
    }
}

impl Default for PowerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PowerDrawLookup for PowerTable {
    fn watts(&self, compute_type: &str) -> Option<f64> {
        self.watts.get(compute_type).copied()
    }
}

/// Estimated energy for one record, in kWh rounded to 6 decimals.
///
/// A collector-supplied measurement wins over the heuristic
/// `nodes * hours * kW * utilization * pue`.
pub fn estimate_energy_kwh(record: &UsageRecord, power: &impl PowerDrawLookup, pue: f64) -> f64 {
    if let Some(kwh) = record.collector_kwh {
        return round6(kwh);
    }
    let nodes = f64::from(record.node_count.unwrap_or(1));
    let hours = record.duration_hours().max(MIN_DURATION_HOURS);
    let watts = record
        .compute_type
        .as_deref()
        .and_then(|shape| power.watts(shape))
        .unwrap_or(DEFAULT_NODE_WATTS);
    let utilization = (record
        .avg_cpu_utilization
        .unwrap_or(DEFAULT_CPU_UTILIZATION_PCT)
        / 100.0)
        .clamp(0.0, 1.0);
    round6(nodes * hours * (watts / 1000.0) * utilization * pue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn record(minutes: i64) -> UsageRecord {
        let started_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        UsageRecord {
            source: "spark".to_string(),
            run_id: Some("run-1".to_string()),
            cloud: "azure".to_string(),
            region_code: "eastus".to_string(),
            compute_type: None,
            node_count: None,
            avg_cpu_utilization: None,
            avg_gpu_utilization: None,
            gpu_type: None,
            started_at,
            ended_at: started_at + Duration::minutes(minutes),
            dbu: None,
            bytes_read: None,
            bytes_written: None,
            rows_processed: None,
            collector_kwh: None,
            raw: json!({}),
        }
    }

    #[test]
    fn unknown_shape_one_hour_uses_defaults() {
        let usage = record(60);
        let kwh = estimate_energy_kwh(&usage, &PowerTable::builtin(), 1.0);
        assert_eq!(kwh, 0.066);
    }

    #[test]
    fn collector_measurement_is_returned_unchanged() {
        let mut usage = record(60);
        usage.collector_kwh = Some(1.234_567_89);
        usage.compute_type = Some("Standard_NC6s_v3".to_string());
        let kwh = estimate_energy_kwh(&usage, &PowerTable::builtin(), 1.5);
        assert_eq!(kwh, 1.234568);
    }

    #[test]
    fn zero_and_negative_durations_use_floor() {
        let zero = estimate_energy_kwh(&record(0), &PowerTable::builtin(), 1.0);
        let negative = estimate_energy_kwh(&record(-90), &PowerTable::builtin(), 1.0);
        let expected = round6(MIN_DURATION_HOURS * 0.12 * 0.55);
        assert_eq!(zero, expected);
        assert_eq!(negative, expected);
        assert!(zero > 0.0);
    }

    #[test]
    fn known_shape_and_nodes_scale_estimate() {
        let mut usage = record(30);
        usage.compute_type = Some("Standard_D8_v5".to_string());
        usage.node_count = Some(4);
        usage.avg_cpu_utilization = Some(80.0);
        let kwh = estimate_energy_kwh(&usage, &PowerTable::builtin(), 1.0);
        assert_eq!(kwh, round6(4.0 * 0.5 * 0.2 * 0.8));
    }

    #[test]
    fn utilization_is_clamped_to_unit_range() {
        let mut usage = record(60);
        usage.avg_cpu_utilization = Some(250.0);
        assert_eq!(
            estimate_energy_kwh(&usage, &PowerTable::builtin(), 1.0),
            0.12
        );
        usage.avg_cpu_utilization = Some(-5.0);
        assert_eq!(estimate_energy_kwh(&usage, &PowerTable::builtin(), 1.0), 0.0);
    }

    #[test]
    fn custom_table_overrides_builtin_shapes() {
        let mut usage = record(60);
        usage.compute_type = Some("m5.2xlarge".to_string());
        usage.avg_cpu_utilization = Some(100.0);
        let table = PowerTable::empty().with_shape("m5.2xlarge", 150.0);
        assert_eq!(estimate_energy_kwh(&usage, &table, 1.0), 0.15);
    }

    #[test]
    fn pue_multiplies_heuristic() {
        let usage = record(60);
        assert_eq!(
            estimate_energy_kwh(&usage, &PowerTable::builtin(), 1.2),
            round6(0.066 * 1.2)
        );
    }
}
