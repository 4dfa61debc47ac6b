use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use verdant_core::{BudgetBreach, EmissionRecord, NewEmissionRecord, TimeRange};

use crate::Db;
use crate::error::Result;
use crate::helpers::{EMISSION_COLUMNS, format_ts, row_to_emission_record, to_i64};

/// Ids assigned when a record and its alert are written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedIds {
    pub record_id: i64,
    pub alert_id: Option<i64>,
}

impl Db {
    pub fn insert_emission_record(&self, record: &NewEmissionRecord) -> Result<i64> {
        insert_record(&self.conn, record)
    }

    /// Writes the record and, when given, its budget alert in one transaction.
    pub fn insert_emission_with_alert(
        &mut self,
        record: &NewEmissionRecord,
        breach: Option<&BudgetBreach>,
    ) -> Result<InsertedIds> {
        let tx = self.conn.transaction()?;
        let record_id = insert_record(&tx, record)?;
        let alert_id = match breach {
            Some(breach) => Some(crate::alerts::insert_alert_row(
                &tx,
                &breach.into_alert(record_id),
            )?),
            None => None,
        };
        tx.commit()?;
        Ok(InsertedIds {
            record_id,
            alert_id,
        })
    }

    pub fn has_event_key(&self, event_key: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM emission_record WHERE event_key = ?1",
                params![event_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_emission_record(&self, id: i64) -> Result<Option<EmissionRecord>> {
        let sql = format!("SELECT {} FROM emission_record WHERE id = ?1", EMISSION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_emission_record(row)?)),
            None => Ok(None),
        }
    }

    /// Records whose start falls in the window, newest first.
    pub fn list_emission_records(
        &self,
        range: &TimeRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EmissionRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM emission_record
            WHERE started_at >= ?1 AND started_at < ?2
            ORDER BY started_at DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            EMISSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![range.start, range.end, limit, offset])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(row_to_emission_record(row)?);
        }
        Ok(records)
    }

    pub fn count_emission_records(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM emission_record", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn insert_record(conn: &Connection, record: &NewEmissionRecord) -> Result<i64> {
    let usage = &record.usage;
    let raw_json = serde_json::to_string(&usage.raw)?;
    conn.execute(
        r#"
        INSERT INTO emission_record (
          source, run_id, cloud, region_code, compute_type, node_count,
          avg_cpu_utilization, avg_gpu_utilization, gpu_type, started_at, ended_at,
          dbu, bytes_read, bytes_written, rows_processed, collector_kwh,
          est_kwh, est_co2e_kg, grid_intensity_g_per_kwh, event_key, raw_json, created_at
        ) VALUES (
          ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
          ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
        )
        "#,
        params![
            usage.source,
            usage.run_id,
            usage.cloud,
            usage.region_code,
            usage.compute_type,
            usage.node_count,
            usage.avg_cpu_utilization,
            usage.avg_gpu_utilization,
            usage.gpu_type,
            format_ts(&usage.started_at),
            format_ts(&usage.ended_at),
            usage.dbu,
            to_i64(usage.bytes_read),
            to_i64(usage.bytes_written),
            to_i64(usage.rows_processed),
            usage.collector_kwh,
            record.estimate.kwh,
            record.estimate.co2e_kg,
            record.estimate.intensity_g_per_kwh,
            record.event_key,
            raw_json,
            format_ts(&Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
