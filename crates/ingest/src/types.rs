use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Usage payload already shaped by a collector: camelCase, percent utilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePayload {
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
    #[serde(rename = "estKWh")]
    pub est_kwh: Option<f64>,
}

/// Structured job-end event emitted by runtime hooks. Utilization is 0..1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event_type: String,
    pub org_id: String,
    pub project_id: String,
    pub workload: WorkloadInfo,
    #[serde(default)]
    pub metrics: WorkloadMetrics,
    pub timestamps: WorkloadTimestamps,
    #[serde(default)]
    pub labels: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadInfo {
    pub external_id: String,
    pub name: Option<String>,
    pub kind: String,
    pub region: Option<String>,
    pub resource_sku: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadMetrics {
    pub duration_ms: Option<u64>,
    pub cpu_util_avg: Option<f64>,
    pub mem_gb: Option<f64>,
    pub bytes_read: Option<u64>,
    pub bytes_written: Option<u64>,
    pub nodes: Option<u32>,
    pub gpu_type: Option<String>,
    pub gpu_util_avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadTimestamps {
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
}

/// The two accepted inbound shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum EventShape {
    Usage(UsagePayload),
    Telemetry(TelemetryEvent),
}

/// An inbound event together with the exact JSON it arrived as.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub shape: EventShape,
    pub raw: Value,
}

impl InboundEvent {
    pub fn usage(raw: Value) -> Result<Self> {
        let payload = serde_json::from_value(raw.clone()).map_err(IngestError::Shape)?;
        Ok(Self {
            shape: EventShape::Usage(payload),
            raw,
        })
    }

    pub fn telemetry(raw: Value) -> Result<Self> {
        let event = serde_json::from_value(raw.clone()).map_err(IngestError::Shape)?;
        Ok(Self {
            shape: EventShape::Telemetry(event),
            raw,
        })
    }

    /// Picks the shape from the keys present: telemetry events carry nested
    /// `workload` and `timestamps` objects.
    pub fn detect(raw: Value) -> Result<Self> {
        let is_telemetry = raw.get("workload").is_some_and(Value::is_object)
            && raw.get("timestamps").is_some_and(Value::is_object);
        if is_telemetry {
            Self::telemetry(raw)
        } else {
            Self::usage(raw)
        }
    }
}

/// Summary returned after importing telemetry exports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub lines_read: usize,
    pub events_parsed: usize,
    pub events_inserted: usize,
    pub duplicates_skipped: usize,
    pub alerts_raised: usize,
    pub issues: Vec<IngestIssue>,
}

/// Non-fatal issues encountered during import.
#[derive(Debug, Clone, Serialize)]
pub struct IngestIssue {
    pub file_path: String,
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed event: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("invalid event: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
