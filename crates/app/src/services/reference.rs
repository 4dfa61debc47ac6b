use crate::error::{AppError, Result};
use crate::intensity::write_intensity_defaults;
use crate::services::{SharedConfig, open_db};
use verdant_core::{Budget, BudgetInput, IntensityEntry};
use verdant_db::Db;

/// Region intensities and emission budgets.
#[derive(Clone)]
pub struct ReferenceService {
    config: SharedConfig,
}

impl ReferenceService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn intensity_list(&self) -> Result<Vec<IntensityEntry>> {
        let db = self.db()?;
        Ok(db.list_intensities()?)
    }

    /// Replaces the whole region table and mirrors it to the defaults file.
    pub fn intensity_replace(&self, entries: &[IntensityEntry]) -> Result<Vec<IntensityEntry>> {
        for entry in entries {
            if entry.cloud.trim().is_empty() || entry.region_code.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "cloud and region_code are required".to_string(),
                ));
            }
            if !entry.g_per_kwh.is_finite() || entry.g_per_kwh < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "invalid intensity {} for {}/{}",
                    entry.g_per_kwh, entry.cloud, entry.region_code
                )));
            }
        }
        let mut db = self.db()?;
        db.replace_intensities(entries)?;
        let stored = db.list_intensities()?;
        write_intensity_defaults(&self.config.intensity_defaults_path, &stored)?;
        tracing::info!(count = stored.len(), "region intensities replaced");
        Ok(stored)
    }

    pub fn budgets_list(&self) -> Result<Vec<Budget>> {
        let db = self.db()?;
        Ok(db.list_budgets()?)
    }

    pub fn budgets_put(&self, input: BudgetInput) -> Result<Budget> {
        let source = input.source.trim().to_string();
        if source.is_empty() {
            return Err(AppError::InvalidInput("source is required".to_string()));
        }
        if !input.budget_kg.is_finite() || input.budget_kg < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "budget_kg must be a non-negative number, got {}",
                input.budget_kg
            )));
        }
        let run_id = input
            .run_id
            .map(|run_id| run_id.trim().to_string())
            .filter(|run_id| !run_id.is_empty());
        let db = self.db()?;
        let budget = db.upsert_budget(&BudgetInput {
            source,
            run_id,
            budget_kg: input.budget_kg,
        })?;
        tracing::info!(
            budget_id = budget.id,
            source = %budget.source,
            budget_kg = budget.budget_kg,
            "budget stored"
        );
        Ok(budget)
    }

    pub fn budgets_delete(&self, id: i64) -> Result<()> {
        let db = self.db()?;
        if db.delete_budget(id)? == 0 {
            return Err(AppError::NotFound(format!("budget {} not found", id)));
        }
        Ok(())
    }
}
