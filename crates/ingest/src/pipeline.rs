use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde_json::Value;
use sha2::{Digest, Sha256};
use verdant_core::UsageRecord;
use walkdir::WalkDir;

use crate::normalize::normalize;
use crate::types::{InboundEvent, IngestIssue, IngestStats, Result};

/// A normalized event read from an export file.
#[derive(Debug, Clone)]
pub struct ScannedEvent {
    pub record: UsageRecord,
    pub event_key: String,
    pub file_path: String,
    pub line: usize,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub events: Vec<ScannedEvent>,
    pub stats: IngestStats,
}

struct ParsedFile {
    events: Vec<ScannedEvent>,
    issues: Vec<IngestIssue>,
    lines_read: usize,
    skipped: bool,
}

fn is_export_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|value| value.to_str()),
        Some("jsonl") | Some("ndjson")
    )
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

/// Content key for an exported line, independent of the file it came from.
pub fn event_key(line: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(line.trim().as_bytes());
    hex_digest(&hasher.finalize())
}

/// Parses one NDJSON line into a normalized record.
pub fn parse_line(line: &str) -> Result<UsageRecord> {
    let raw: Value = serde_json::from_str(line).map_err(crate::IngestError::Shape)?;
    normalize(InboundEvent::detect(raw)?)
}

fn export_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_export_path(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn parse_file(path: &Path) -> ParsedFile {
    let file_path = path.to_string_lossy().to_string();
    let mut parsed = ParsedFile {
        events: Vec::new(),
        issues: Vec::new(),
        lines_read: 0,
        skipped: false,
    };
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            parsed.issues.push(IngestIssue {
                file_path,
                line: None,
                message: err.to_string(),
            });
            parsed.skipped = true;
            return parsed;
        }
    };
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_no = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                parsed.issues.push(IngestIssue {
                    file_path: file_path.clone(),
                    line: Some(line_no),
                    message: err.to_string(),
                });
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        parsed.lines_read += 1;
        match parse_line(&line) {
            Ok(record) => parsed.events.push(ScannedEvent {
                record,
                event_key: event_key(&line),
                file_path: file_path.clone(),
                line: line_no,
            }),
            Err(err) => parsed.issues.push(IngestIssue {
                file_path: file_path.clone(),
                line: Some(line_no),
                message: err.to_string(),
            }),
        }
    }
    parsed
}

/// Reads every `.jsonl`/`.ndjson` export under `root` (or `root` itself when it
/// is a file), normalizing lines in parallel. Output keeps file and line order.
pub fn scan_exports(root: &Path) -> ScanOutput {
    let started = Instant::now();
    let files = export_files(root);
    let parsed: Vec<ParsedFile> = files.par_iter().map(|path| parse_file(path)).collect();

    let mut output = ScanOutput::default();
    for file in parsed {
        output.stats.files_scanned += 1;
        if file.skipped {
            output.stats.files_skipped += 1;
        }
        output.stats.lines_read += file.lines_read;
        output.stats.events_parsed += file.events.len();
        output.stats.issues.extend(file.issues);
        output.events.extend(file.events);
    }
    tracing::debug!(
        root = %root.display(),
        files = output.stats.files_scanned,
        events = output.stats.events_parsed,
        issues = output.stats.issues.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scanned telemetry exports"
    );
    output
}
