use chrono::Utc;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};
use verdant_core::{
    Alert, DailyRollup, EmissionRecord, GreenScore, HotspotEntry, ScoreTargets, TimeRange,
    WindowSummary, green_score,
};
use verdant_db::Db;

#[derive(Clone)]
pub struct AnalyticsService {
    config: SharedConfig,
}

impl AnalyticsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn summarize(&self, range: &TimeRange) -> Result<WindowSummary> {
        let db = self.db()?;
        Ok(db.summarize(range)?)
    }

    pub fn green_score(&self, range: &TimeRange, targets: ScoreTargets) -> Result<GreenScore> {
        for (name, value) in [
            ("target_kg_per_tb", targets.kg_per_tb),
            ("target_freshness_hours", targets.freshness_hours),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        let db = self.db()?;
        let inputs = db.score_inputs(range)?;
        Ok(green_score(
            range.clone(),
            inputs,
            targets,
            self.config.score_weights,
            Utc::now(),
        ))
    }

    pub fn hotspots(&self, range: &TimeRange, limit: u32) -> Result<Vec<HotspotEntry>> {
        let db = self.db()?;
        Ok(db.hotspots(range, limit)?)
    }

    pub fn alerts(&self, limit: u32) -> Result<Vec<Alert>> {
        let db = self.db()?;
        Ok(db.list_alerts(limit)?)
    }

    pub fn records(
        &self,
        range: &TimeRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<EmissionRecord>> {
        let db = self.db()?;
        Ok(db.list_emission_records(range, limit, offset)?)
    }

    pub fn record(&self, id: i64) -> Result<EmissionRecord> {
        let db = self.db()?;
        db.get_emission_record(id)?
            .ok_or_else(|| AppError::NotFound(format!("record {} not found", id)))
    }

    pub fn daily_rollup(&self, range: &TimeRange) -> Result<Vec<DailyRollup>> {
        let db = self.db()?;
        Ok(db.daily_rollup(range)?)
    }
}
