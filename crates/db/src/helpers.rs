use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use serde_json::Value;
use verdant_core::{
    Alert, AlertKind, AlertWorkload, Budget, EmissionRecord, Severity, UsageRecord,
};

use crate::error::{DbError, Result};

/// Stored timestamp format. Fixed width so that text comparison orders by time.
pub fn format_ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub(crate) fn to_i64(value: Option<u64>) -> Option<i64> {
    value.map(|value| i64::try_from(value).unwrap_or(i64::MAX))
}

pub(crate) fn to_u64(value: Option<i64>) -> Option<u64> {
    value.map(|value| value.max(0) as u64)
}

pub(crate) const EMISSION_COLUMNS: &str = r#"
    id, source, run_id, cloud, region_code, compute_type, node_count,
    avg_cpu_utilization, avg_gpu_utilization, gpu_type, started_at, ended_at,
    dbu, bytes_read, bytes_written, rows_processed, collector_kwh,
    est_kwh, est_co2e_kg, grid_intensity_g_per_kwh, event_key, raw_json, created_at
"#;

pub(crate) fn row_to_emission_record(row: &Row<'_>) -> Result<EmissionRecord> {
    let started_at: String = row.get(10)?;
    let ended_at: String = row.get(11)?;
    let raw_json: String = row.get(21)?;
    Ok(EmissionRecord {
        id: row.get(0)?,
        usage: UsageRecord {
            source: row.get(1)?,
            run_id: row.get(2)?,
            cloud: row.get(3)?,
            region_code: row.get(4)?,
            compute_type: row.get(5)?,
            node_count: row.get(6)?,
            avg_cpu_utilization: row.get(7)?,
            avg_gpu_utilization: row.get(8)?,
            gpu_type: row.get(9)?,
            started_at: parse_ts(&started_at)?,
            ended_at: parse_ts(&ended_at)?,
            dbu: row.get(12)?,
            bytes_read: to_u64(row.get(13)?),
            bytes_written: to_u64(row.get(14)?),
            rows_processed: to_u64(row.get(15)?),
            collector_kwh: row.get(16)?,
            raw: serde_json::from_str::<Value>(&raw_json)?,
        },
        est_kwh: row.get(17)?,
        est_co2e_kg: row.get(18)?,
        grid_intensity_g_per_kwh: row.get(19)?,
        event_key: row.get(20)?,
        created_at: row.get(22)?,
    })
}

pub(crate) fn row_to_alert(row: &Row<'_>) -> Result<Alert> {
    let kind: String = row.get(3)?;
    let severity: String = row.get(4)?;
    let meta_json: String = row.get(6)?;
    Ok(Alert {
        id: row.get(0)?,
        workload_id: row.get(1)?,
        created_at: row.get(2)?,
        kind: AlertKind::from(kind),
        severity: Severity::parse(&severity)
            .ok_or_else(|| DbError::InvalidValue(format!("alert severity {}", severity)))?,
        message: row.get(5)?,
        meta: serde_json::from_str(&meta_json)?,
        workload: AlertWorkload {
            source: row.get(7)?,
            run_id: row.get(8)?,
            region_code: row.get(9)?,
            compute_type: row.get(10)?,
            co2e_kg: row.get::<_, Option<f64>>(11)?.unwrap_or(0.0),
            started_at: row.get(12)?,
            ended_at: row.get(13)?,
        },
    })
}

pub(crate) fn row_to_budget(row: &Row<'_>) -> std::result::Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        source: row.get(1)?,
        run_id: row.get(2)?,
        budget_kg: row.get(3)?,
    })
}
