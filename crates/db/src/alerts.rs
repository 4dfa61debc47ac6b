use chrono::Utc;
use rusqlite::{Connection, params};
use verdant_core::{Alert, NewAlert};

use crate::Db;
use crate::error::Result;
use crate::helpers::{format_ts, row_to_alert};

impl Db {
    pub fn insert_alert(&self, alert: &NewAlert) -> Result<i64> {
        insert_alert_row(&self.conn, alert)
    }

    /// Most recent alerts first, with the owning workload's columns.
    pub fn list_alerts(&self, limit: u32) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.workload_id, a.created_at, a.kind, a.severity, a.message, a.meta_json,
                   w.source, w.run_id, w.region_code, w.compute_type, w.est_co2e_kg,
                   w.started_at, w.ended_at
            FROM alert a
            LEFT JOIN emission_record w ON w.id = a.workload_id
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ?1
            "#,
        )?;
        let mut rows = stmt.query(params![limit])?;
        let mut alerts = Vec::new();
        while let Some(row) = rows.next()? {
            alerts.push(row_to_alert(row)?);
        }
        Ok(alerts)
    }

    pub fn count_alerts_for_workload(&self, workload_id: i64) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM alert WHERE workload_id = ?1",
            params![workload_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

pub(crate) fn insert_alert_row(conn: &Connection, alert: &NewAlert) -> Result<i64> {
    let meta_json = serde_json::to_string(&alert.meta)?;
    conn.execute(
        r#"
        INSERT INTO alert (workload_id, created_at, kind, severity, message, meta_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            alert.workload_id,
            format_ts(&Utc::now()),
            alert.kind.as_str(),
            alert.severity.as_str(),
            alert.message,
            meta_json,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
