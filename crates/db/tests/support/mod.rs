#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::json;
use tempfile::TempDir;
use verdant_core::{EmissionEstimate, NewEmissionRecord, UsageRecord};
use verdant_db::Db;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("timestamp")
        .with_timezone(&Utc)
}

pub fn make_usage(source: &str, run_id: Option<&str>, started_at: &str, ended_at: &str) -> UsageRecord {
    UsageRecord {
        source: source.to_string(),
        run_id: run_id.map(str::to_string),
        cloud: "azure".to_string(),
        region_code: "eastus".to_string(),
        compute_type: Some("Standard_D8_v5".to_string()),
        node_count: Some(1),
        avg_cpu_utilization: Some(55.0),
        avg_gpu_utilization: None,
        gpu_type: None,
        started_at: ts(started_at),
        ended_at: ts(ended_at),
        dbu: None,
        bytes_read: None,
        bytes_written: None,
        rows_processed: None,
        collector_kwh: None,
        raw: json!({ "source": source }),
    }
}

pub fn make_record(usage: UsageRecord, kwh: f64, co2e_kg: f64) -> NewEmissionRecord {
    NewEmissionRecord {
        usage,
        estimate: EmissionEstimate {
            kwh,
            co2e_kg,
            intensity_g_per_kwh: 450.0,
        },
        event_key: None,
    }
}

pub fn insert(db: &Db, usage: UsageRecord, kwh: f64, co2e_kg: f64) -> i64 {
    db.insert_emission_record(&make_record(usage, kwh, co2e_kg))
        .expect("insert record")
}
