use chrono::{NaiveTime, Utc};
use rusqlite::params;
use verdant_core::{DailyRollup, TimeRange};

use crate::Db;
use crate::error::Result;
use crate::helpers::{format_ts, parse_ts};

impl Db {
    /// Recomputes the materialized totals for one UTC day (`YYYY-MM-DD`).
    /// A day left without records loses its row.
    pub fn refresh_daily_rollup(&self, day: &str) -> Result<Option<DailyRollup>> {
        let (records, kwh, co2e_kg, bytes_io): (i64, f64, f64, i64) = self.conn.query_row(
            r#"
            SELECT
              COUNT(*),
              COALESCE(SUM(est_kwh), 0),
              COALESCE(SUM(est_co2e_kg), 0),
              COALESCE(SUM(COALESCE(bytes_read, 0) + COALESCE(bytes_written, 0)), 0)
            FROM emission_record
            WHERE substr(started_at, 1, 10) = ?1
            "#,
            params![day],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        if records == 0 {
            self.conn.execute(
                "DELETE FROM daily_emission_rollup WHERE day = ?1",
                params![day],
            )?;
            return Ok(None);
        }

        let rollup = DailyRollup {
            day: day.to_string(),
            records: records as u64,
            kwh,
            co2e_kg,
            bytes_io: bytes_io.max(0) as u64,
            refreshed_at: format_ts(&Utc::now()),
        };
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO daily_emission_rollup
              (day, records, kwh, co2e_kg, bytes_io, refreshed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                rollup.day,
                records,
                rollup.kwh,
                rollup.co2e_kg,
                bytes_io,
                rollup.refreshed_at
            ],
        )?;
        Ok(Some(rollup))
    }

    /// Materialized days touching the window, ascending. A window ending at
    /// midnight stops before that day.
    pub fn daily_rollup(&self, range: &TimeRange) -> Result<Vec<DailyRollup>> {
        let end_day = exclusive_end_day(&range.end)?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT day, records, kwh, co2e_kg, bytes_io, refreshed_at
            FROM daily_emission_rollup
            WHERE day >= substr(?1, 1, 10) AND day < ?2
            ORDER BY day ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![range.start, end_day], |row| {
                Ok(DailyRollup {
                    day: row.get(0)?,
                    records: row.get::<_, i64>(1)?.max(0) as u64,
                    kwh: row.get(2)?,
                    co2e_kg: row.get(3)?,
                    bytes_io: row.get::<_, i64>(4)?.max(0) as u64,
                    refreshed_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn exclusive_end_day(end: &str) -> Result<String> {
    let end = parse_ts(end)?;
    let date = end.date_naive();
    let date = if end.time() == NaiveTime::MIN {
        date
    } else {
        date.succ_opt().unwrap_or(date)
    };
    Ok(date.format("%Y-%m-%d").to_string())
}
