use serde::Serialize;

use crate::config::CarbonSettings;
use crate::error::Result;
use crate::services::{SharedConfig, open_db};
use verdant_core::ScoreWeights;

/// Effective carbon settings plus store counters.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsSnapshot {
    pub db_path: String,
    pub carbon: CarbonSettings,
    pub score_weights: ScoreWeights,
    pub record_count: u64,
    pub intensity_regions: usize,
    pub budgets: usize,
}

#[derive(Clone)]
pub struct SettingsService {
    config: SharedConfig,
}

impl SettingsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn get(&self) -> Result<SettingsSnapshot> {
        let db = open_db(&self.config)?;
        Ok(SettingsSnapshot {
            db_path: self.config.db_path.to_string_lossy().to_string(),
            carbon: self.config.carbon.clone(),
            score_weights: self.config.score_weights,
            record_count: db.count_emission_records()?,
            intensity_regions: db.list_intensities()?.len(),
            budgets: db.list_budgets()?.len(),
        })
    }
}
