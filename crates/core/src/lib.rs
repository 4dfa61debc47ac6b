mod budget;
mod emissions;
mod energy;
mod model;
mod score;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use budget::{
    BudgetBreach, BudgetLookup, BudgetTable, CRITICAL_BUDGET_RATIO, evaluate_budget,
    resolve_budget,
};
pub use emissions::{
    DEFAULT_GRID_INTENSITY_G_PER_KWH, EmissionEstimate, IntensityLookup, IntensityTable,
    builtin_intensity_entries, co2e_kg_from_kwh, resolve_intensity,
};
pub use energy::{
    DEFAULT_CPU_UTILIZATION_PCT, DEFAULT_NODE_WATTS, MIN_DURATION_HOURS, PowerDrawLookup,
    PowerTable, estimate_energy_kwh,
};
pub use model::CarbonModel;
pub use score::{
    BYTES_PER_TB, DEFAULT_PARTITIONED_SCAN_PCT, ScoreInputs, ScoreTargets, ScoreWeights,
    efficiency_score, freshness_score, green_score, kg_per_tb, mean_partitioned_scan,
    partitioned_scan_fraction, partitioning_score,
};

/// Decimal places kept for stored energy and emissions values.
pub const ESTIMATE_DECIMALS: i32 = 6;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round6(value: f64) -> f64 {
    round_to(value, ESTIMATE_DECIMALS)
}

/// Canonical usage record produced by the normalizer.
///
/// Optional numerics stay `None` when the collector did not report them so
/// that "unknown" never turns into a zero in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub source: String,
    pub run_id: Option<String>,
    pub cloud: String,
    pub region_code: String,
    pub compute_type: Option<String>,
    pub node_count: Option<u32>,
    pub avg_cpu_utilization: Option<f64>,
    pub avg_gpu_utilization: Option<f64>,
    pub gpu_type: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub dbu: Option<f64>,
    pub bytes_read: Option<u64>,
    pub bytes_written: Option<u64>,
    pub rows_processed: Option<u64>,
    pub collector_kwh: Option<f64>,
    pub raw: Value,
}

impl UsageRecord {
    /// Wall-clock duration in hours. Negative when the collector reported an
    /// end before the start; the estimator applies its own floor.
    pub fn duration_hours(&self) -> f64 {
        let millis = (self.ended_at - self.started_at).num_milliseconds();
        millis as f64 / 3_600_000.0
    }

    /// Bytes read plus bytes written, or `None` when neither was reported.
    pub fn bytes_io(&self) -> Option<u64> {
        match (self.bytes_read, self.bytes_written) {
            (None, None) => None,
            (read, written) => Some(read.unwrap_or(0).saturating_add(written.unwrap_or(0))),
        }
    }
}

/// Emission record ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmissionRecord {
    pub usage: UsageRecord,
    pub estimate: EmissionEstimate,
    pub event_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub usage: UsageRecord,
    pub est_kwh: f64,
    pub est_co2e_kg: f64,
    pub grid_intensity_g_per_kwh: f64,
    pub event_key: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Alert taxonomy. Kinds written by newer releases survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    BudgetBreach,
    Other(String),
}

impl AlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::BudgetBreach => "budget_breach",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for AlertKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "budget_breach" => Self::BudgetBreach,
            _ => Self::Other(value),
        }
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub workload_id: i64,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub meta: Value,
}

/// Workload columns shown next to an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertWorkload {
    pub source: Option<String>,
    pub run_id: Option<String>,
    pub region_code: Option<String>,
    pub compute_type: Option<String>,
    pub co2e_kg: f64,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub workload_id: Option<i64>,
    pub created_at: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub meta: Value,
    pub workload: AlertWorkload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityEntry {
    pub cloud: String,
    pub region_code: String,
    pub g_per_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub source: String,
    pub run_id: Option<String>,
    pub budget_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInput {
    pub source: String,
    pub run_id: Option<String>,
    pub budget_kg: f64,
}

/// Half-open `[start, end)` window of RFC 3339 UTC timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub kwh: f64,
    pub co2e_kg: f64,
    pub bytes_io: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub day: String,
    pub kwh: f64,
    pub co2e_kg: f64,
    pub bytes_io: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub range: TimeRange,
    pub totals: WindowTotals,
    pub daily: Vec<DailyTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotEntry {
    pub source: String,
    pub run_id: Option<String>,
    pub compute_type: Option<String>,
    pub region_code: Option<String>,
    pub runs: u64,
    pub kwh: f64,
    pub co2e_kg: f64,
    pub bytes_io: u64,
    pub last_run_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRollup {
    pub day: String,
    pub records: u64,
    pub kwh: f64,
    pub co2e_kg: f64,
    pub bytes_io: u64,
    pub refreshed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenScoreMetrics {
    pub co2e_kg: f64,
    pub bytes_io: u64,
    pub tb_processed: f64,
    pub kg_per_tb: f64,
    pub last_ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreenScoreComponents {
    pub efficiency: f64,
    pub partitioning: f64,
    pub freshness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenScore {
    pub range: TimeRange,
    pub metrics: GreenScoreMetrics,
    pub components: GreenScoreComponents,
    pub overall: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record() -> UsageRecord {
        UsageRecord {
            source: "spark".to_string(),
            run_id: None,
            cloud: "azure".to_string(),
            region_code: "eastus".to_string(),
            compute_type: None,
            node_count: None,
            avg_cpu_utilization: None,
            avg_gpu_utilization: None,
            gpu_type: None,
            started_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            ended_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 30, 0).unwrap(),
            dbu: None,
            bytes_read: None,
            bytes_written: None,
            rows_processed: None,
            collector_kwh: None,
            raw: json!({}),
        }
    }

    #[test]
    fn round6_trims_float_noise() {
        assert_eq!(round6(0.066_000_000_000_000_003), 0.066);
        assert_eq!(round6(0.0297 - 0.02), 0.0097);
    }

    #[test]
    fn bytes_io_keeps_unknown_distinct_from_zero() {
        let mut usage = record();
        assert_eq!(usage.bytes_io(), None);
        usage.bytes_written = Some(0);
        assert_eq!(usage.bytes_io(), Some(0));
        usage.bytes_read = Some(10);
        assert_eq!(usage.bytes_io(), Some(10));
    }

    #[test]
    fn duration_hours_can_be_negative() {
        let mut usage = record();
        assert!((usage.duration_hours() - 0.5).abs() < 1e-12);
        std::mem::swap(&mut usage.started_at, &mut usage.ended_at);
        assert!(usage.duration_hours() < 0.0);
    }

    #[test]
    fn alert_kind_round_trips_unknown_values() {
        let kind: AlertKind = serde_json::from_str("\"budget_breach\"").expect("kind");
        assert_eq!(kind, AlertKind::BudgetBreach);
        let kind: AlertKind = serde_json::from_str("\"idle_cluster\"").expect("kind");
        assert_eq!(kind.as_str(), "idle_cluster");
        assert_eq!(
            serde_json::to_string(&kind).expect("serialize"),
            "\"idle_cluster\""
        );
    }
}
