use rusqlite::{OptionalExtension, params};
use verdant_core::{Budget, BudgetInput, BudgetLookup, IntensityEntry, IntensityLookup};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::row_to_budget;

impl Db {
    pub fn list_intensities(&self) -> Result<Vec<IntensityEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT cloud, region_code, g_per_kwh
            FROM region_intensity
            ORDER BY cloud ASC, region_code ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(IntensityEntry {
                    cloud: row.get(0)?,
                    region_code: row.get(1)?,
                    g_per_kwh: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn replace_intensities(&mut self, entries: &[IntensityEntry]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM region_intensity", [])?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO region_intensity (cloud, region_code, g_per_kwh)
                VALUES (?1, ?2, ?3)
                "#,
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.cloud.to_ascii_lowercase(),
                    entry.region_code.to_ascii_lowercase(),
                    entry.g_per_kwh
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn intensity_for(&self, cloud: &str, region_code: &str) -> Result<Option<f64>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT g_per_kwh FROM region_intensity
                WHERE cloud = lower(?1) AND region_code = lower(?2)
                "#,
                params![cloud, region_code],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source, run_id, budget_kg
            FROM emission_budget
            ORDER BY source ASC, run_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Inserts a budget or replaces the ceiling of an existing (source, run) scope.
    pub fn upsert_budget(&self, input: &BudgetInput) -> Result<Budget> {
        if !input.budget_kg.is_finite() || input.budget_kg < 0.0 {
            return Err(DbError::InvalidValue(format!(
                "budget_kg {}",
                input.budget_kg
            )));
        }
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM emission_budget WHERE source = ?1 AND run_id IS ?2",
                params![input.source, input.run_id],
                |row| row.get(0),
            )
            .optional()?;
        let id = match existing {
            Some(id) => {
                self.conn.execute(
                    "UPDATE emission_budget SET budget_kg = ?1 WHERE id = ?2",
                    params![input.budget_kg, id],
                )?;
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO emission_budget (source, run_id, budget_kg) VALUES (?1, ?2, ?3)",
                    params![input.source, input.run_id, input.budget_kg],
                )?;
                self.conn.last_insert_rowid()
            }
        };
        Ok(Budget {
            id,
            source: input.source.clone(),
            run_id: input.run_id.clone(),
            budget_kg: input.budget_kg,
        })
    }

    pub fn delete_budget(&self, id: i64) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM emission_budget WHERE id = ?1", params![id])?)
    }

    /// Budget stored for exactly this scope; `run_id = None` is the source-wide entry.
    pub fn budget_for_scope(&self, source: &str, run_id: Option<&str>) -> Result<Option<f64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT budget_kg FROM emission_budget WHERE source = ?1 AND run_id IS ?2",
                params![source, run_id],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl IntensityLookup for Db {
    type Error = DbError;

    fn grid_intensity(&self, cloud: &str, region_code: &str) -> Result<Option<f64>> {
        self.intensity_for(cloud, region_code)
    }
}

impl BudgetLookup for Db {
    type Error = DbError;

    fn budget_kg(&self, source: &str, run_id: Option<&str>) -> Result<Option<f64>> {
        if run_id.is_some() {
            if let Some(budget) = self.budget_for_scope(source, run_id)? {
                return Ok(Some(budget));
            }
        }
        self.budget_for_scope(source, None)
    }
}
