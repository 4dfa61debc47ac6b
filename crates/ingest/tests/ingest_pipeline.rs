use std::fs;

use ingest::{event_key, scan_exports};
use tempfile::tempdir;

const TELEMETRY_LINE: &str = r#"{"event_type":"spark_job_end","org_id":"o","project_id":"p","workload":{"external_id":"job-1","kind":"spark","region":"westeurope"},"metrics":{"cpu_util_avg":0.5,"bytes_read":2048},"timestamps":{"started_at":"2025-01-01T00:00:00Z","ended_at":"2025-01-01T01:00:00Z"}}"#;
const USAGE_LINE: &str = r#"{"source":"adf","runId":"copy-3","cloud":"azure","regionCode":"uksouth","startedAt":"2025-01-02T00:00:00Z","endedAt":"2025-01-02T00:30:00Z"}"#;

#[test]
fn scan_reads_nested_exports_in_order() {
    let dir = tempdir().expect("temp dir");
    let nested = dir.path().join("2025/01");
    fs::create_dir_all(&nested).expect("create dirs");
    fs::write(
        nested.join("a.jsonl"),
        format!("{}\n\n{}\n", TELEMETRY_LINE, USAGE_LINE),
    )
    .expect("write export");
    fs::write(nested.join("notes.txt"), "not an export").expect("write notes");

    let output = scan_exports(dir.path());

    assert_eq!(output.stats.files_scanned, 1);
    assert_eq!(output.stats.lines_read, 2);
    assert_eq!(output.stats.events_parsed, 2);
    assert!(output.stats.issues.is_empty());
    assert_eq!(output.events[0].record.source, "spark");
    assert_eq!(output.events[0].record.avg_cpu_utilization, Some(50.0));
    assert_eq!(output.events[0].line, 1);
    assert_eq!(output.events[1].record.source, "adf");
    assert_eq!(output.events[1].line, 3);
    assert_eq!(output.events[1].event_key, event_key(USAGE_LINE));
}

#[test]
fn scan_reports_bad_lines_without_stopping() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("events.ndjson");
    fs::write(
        &path,
        format!("{{not json\n{}\n{{\"source\":\"x\"}}\n", USAGE_LINE),
    )
    .expect("write export");

    let output = scan_exports(&path);

    assert_eq!(output.stats.lines_read, 3);
    assert_eq!(output.events.len(), 1);
    assert_eq!(output.stats.issues.len(), 2);
    assert_eq!(output.stats.issues[0].line, Some(1));
    assert_eq!(output.stats.issues[1].line, Some(3));
}

#[test]
fn event_key_ignores_surrounding_whitespace() {
    assert_eq!(event_key(USAGE_LINE), event_key(&format!("  {}\r", USAGE_LINE)));
    assert_ne!(event_key(USAGE_LINE), event_key(TELEMETRY_LINE));
}

#[test]
fn offline_estimate_uses_bundled_region_intensity() {
    use verdant_core::{CarbonModel, IntensityTable, builtin_intensity_entries};

    let record = ingest::parse_line(
        r#"{"source":"adf","runId":"copy-1","cloud":"azure","regionCode":"EastUS","computeType":"Standard_D8_v5","nodeCount":1,"avgCpuUtilization":50,"startedAt":"2025-01-10T00:00:00Z","endedAt":"2025-01-10T02:00:00Z"}"#,
    )
    .expect("usage line");
    let table = IntensityTable::from_entries(&builtin_intensity_entries().expect("bundled table"));
    let Ok(estimate) = CarbonModel::default().compute_emissions(&record, &table);

    assert_eq!(record.region_code, "eastus");
    assert_eq!(estimate.kwh, 0.2);
    assert_eq!(estimate.intensity_g_per_kwh, 350.0);
    assert_eq!(estimate.co2e_kg, 0.07);
}
