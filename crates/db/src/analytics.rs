use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use verdant_core::{
    DailyTotals, HotspotEntry, ScoreInputs, TimeRange, WindowSummary, WindowTotals,
    mean_partitioned_scan,
};

use crate::Db;
use crate::error::Result;
use crate::helpers::parse_ts;

const BYTES_IO_SQL: &str = "COALESCE(bytes_read, 0) + COALESCE(bytes_written, 0)";

impl Db {
    pub fn window_totals(&self, range: &TimeRange) -> Result<WindowTotals> {
        let sql = format!(
            r#"
            SELECT
              COALESCE(SUM(est_kwh), 0),
              COALESCE(SUM(est_co2e_kg), 0),
              COALESCE(SUM({}), 0)
            FROM emission_record
            WHERE started_at >= ?1 AND started_at < ?2
            "#,
            BYTES_IO_SQL
        );
        let totals = self
            .conn
            .query_row(&sql, params![range.start, range.end], |row| {
                Ok(WindowTotals {
                    kwh: row.get(0)?,
                    co2e_kg: row.get(1)?,
                    bytes_io: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })?;
        Ok(totals)
    }

    /// Per UTC calendar day, ascending. Days without records are omitted.
    pub fn daily_totals(&self, range: &TimeRange) -> Result<Vec<DailyTotals>> {
        let sql = format!(
            r#"
            SELECT
              substr(started_at, 1, 10) AS day,
              COALESCE(SUM(est_kwh), 0),
              COALESCE(SUM(est_co2e_kg), 0),
              COALESCE(SUM({}), 0)
            FROM emission_record
            WHERE started_at >= ?1 AND started_at < ?2
            GROUP BY day
            ORDER BY day ASC
            "#,
            BYTES_IO_SQL
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![range.start, range.end], |row| {
                Ok(DailyTotals {
                    day: row.get(0)?,
                    kwh: row.get(1)?,
                    co2e_kg: row.get(2)?,
                    bytes_io: row.get::<_, i64>(3)?.max(0) as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn summarize(&self, range: &TimeRange) -> Result<WindowSummary> {
        Ok(WindowSummary {
            range: range.clone(),
            totals: self.window_totals(range)?,
            daily: self.daily_totals(range)?,
        })
    }

    /// Workloads grouped by `(source, run_id)`, heaviest emitters first.
    pub fn hotspots(&self, range: &TimeRange, limit: u32) -> Result<Vec<HotspotEntry>> {
        let sql = format!(
            r#"
            SELECT
              source,
              run_id,
              MAX(compute_type),
              MAX(region_code),
              COUNT(*),
              COALESCE(SUM(est_kwh), 0),
              COALESCE(SUM(est_co2e_kg), 0) AS co2e,
              COALESCE(SUM({}), 0),
              MAX(ended_at)
            FROM emission_record
            WHERE started_at >= ?1 AND started_at < ?2
            GROUP BY source, run_id
            ORDER BY co2e DESC, source ASC, run_id ASC
            LIMIT ?3
            "#,
            BYTES_IO_SQL
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![range.start, range.end, limit], |row| {
                Ok(HotspotEntry {
                    source: row.get(0)?,
                    run_id: row.get(1)?,
                    compute_type: row.get(2)?,
                    region_code: row.get(3)?,
                    runs: row.get::<_, i64>(4)?.max(0) as u64,
                    kwh: row.get(5)?,
                    co2e_kg: row.get(6)?,
                    bytes_io: row.get::<_, i64>(7)?.max(0) as u64,
                    last_run_at: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Latest workload end across all history, regardless of window.
    pub fn latest_ended_at(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT MAX(ended_at) FROM emission_record", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();
        value.as_deref().map(parse_ts).transpose()
    }

    pub fn raw_payloads(&self, range: &TimeRange) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT raw_json
            FROM emission_record
            WHERE started_at >= ?1 AND started_at < ?2
            ORDER BY started_at ASC, id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![range.start, range.end])?;
        let mut payloads = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            payloads.push(serde_json::from_str(&raw)?);
        }
        Ok(payloads)
    }

    pub fn score_inputs(&self, range: &TimeRange) -> Result<ScoreInputs> {
        let totals = self.window_totals(range)?;
        let payloads = self.raw_payloads(range)?;
        Ok(ScoreInputs {
            co2e_kg: totals.co2e_kg,
            bytes_io: totals.bytes_io,
            partitioned_scan_avg: mean_partitioned_scan(payloads.iter()),
            last_ended_at: self.latest_ended_at()?,
        })
    }
}
