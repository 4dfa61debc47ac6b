use std::collections::BTreeMap;

use serde_json::Value;
use verdant_core::UsageRecord;

use crate::types::{EventShape, InboundEvent, IngestError, Result, TelemetryEvent, UsagePayload};

pub const DEFAULT_REGION: &str = "eastus";
pub const DEFAULT_CLOUD: &str = "azure";

/// Resolves either inbound shape into the canonical record.
pub fn normalize(event: InboundEvent) -> Result<UsageRecord> {
    let InboundEvent { shape, raw } = event;
    match shape {
        EventShape::Usage(payload) => {
            validate_usage(&payload)?;
            Ok(from_usage(payload, raw))
        }
        EventShape::Telemetry(event) => {
            validate_telemetry(&event)?;
            Ok(from_telemetry(event, raw))
        }
    }
}

fn from_usage(payload: UsagePayload, raw: Value) -> UsageRecord {
    UsageRecord {
        source: payload.source.trim().to_string(),
        run_id: payload.run_id,
        cloud: payload.cloud.trim().to_ascii_lowercase(),
        region_code: payload.region_code.trim().to_ascii_lowercase(),
        compute_type: payload.compute_type,
        node_count: payload.node_count,
        avg_cpu_utilization: payload.avg_cpu_utilization,
        avg_gpu_utilization: payload.avg_gpu_utilization,
        gpu_type: payload.gpu_type,
        started_at: payload.started_at,
        ended_at: payload.ended_at,
        dbu: payload.dbu,
        bytes_read: payload.bytes_read,
        bytes_written: payload.bytes_written,
        rows_processed: payload.rows_processed,
        collector_kwh: payload.est_kwh,
        raw,
    }
}

fn from_telemetry(event: TelemetryEvent, raw: Value) -> UsageRecord {
    let ended_at = event.timestamps.ended_at;
    let started_at = event.timestamps.started_at.unwrap_or(ended_at);
    let cloud = label_string(&event.labels, "cloud")
        .map(|cloud| cloud.trim().to_ascii_lowercase())
        .filter(|cloud| !cloud.is_empty())
        .unwrap_or_else(|| DEFAULT_CLOUD.to_string());
    let region_code = event
        .workload
        .region
        .map(|region| region.trim().to_ascii_lowercase())
        .filter(|region| !region.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    UsageRecord {
        source: canonical_source(&event.workload.kind),
        run_id: Some(event.workload.external_id),
        cloud,
        region_code,
        compute_type: event.workload.resource_sku,
        node_count: event.metrics.nodes,
        avg_cpu_utilization: event.metrics.cpu_util_avg.map(fraction_to_percent),
        avg_gpu_utilization: event.metrics.gpu_util_avg.map(fraction_to_percent),
        gpu_type: event.metrics.gpu_type,
        started_at,
        ended_at,
        dbu: None,
        bytes_read: event.metrics.bytes_read,
        bytes_written: event.metrics.bytes_written,
        rows_processed: None,
        collector_kwh: None,
        raw,
    }
}

fn canonical_source(kind: &str) -> String {
    let kind = kind.trim();
    if kind.eq_ignore_ascii_case("spark") {
        "spark".to_string()
    } else {
        kind.to_string()
    }
}

fn fraction_to_percent(value: f64) -> f64 {
    value * 100.0
}

fn label_string(labels: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    match labels.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

fn validate_usage(payload: &UsagePayload) -> Result<()> {
    require_text("source", &payload.source)?;
    require_text("cloud", &payload.cloud)?;
    require_text("regionCode", &payload.region_code)?;
    check_range("avgCpuUtilization", payload.avg_cpu_utilization, 100.0)?;
    check_range("avgGpuUtilization", payload.avg_gpu_utilization, 100.0)?;
    check_nodes("nodeCount", payload.node_count)?;
    if let Some(kwh) = payload.est_kwh {
        if !kwh.is_finite() || kwh < 0.0 {
            return Err(IngestError::Invalid(
                "estKWh must be a non-negative number".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_telemetry(event: &TelemetryEvent) -> Result<()> {
    require_text("workload.external_id", &event.workload.external_id)?;
    require_text("workload.kind", &event.workload.kind)?;
    check_range("metrics.cpu_util_avg", event.metrics.cpu_util_avg, 1.0)?;
    check_range("metrics.gpu_util_avg", event.metrics.gpu_util_avg, 1.0)?;
    check_nodes("metrics.nodes", event.metrics.nodes)
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IngestError::Invalid(format!("missing {}", field)));
    }
    Ok(())
}

fn check_range(field: &str, value: Option<f64>, max: f64) -> Result<()> {
    match value {
        Some(value) if !(0.0..=max).contains(&value) => Err(IngestError::Invalid(format!(
            "{} must be between 0 and {}",
            field, max
        ))),
        _ => Ok(()),
    }
}

fn check_nodes(field: &str, value: Option<u32>) -> Result<()> {
    if value == Some(0) {
        return Err(IngestError::Invalid(format!("{} must be positive", field)));
    }
    Ok(())
}
