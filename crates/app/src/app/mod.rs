use std::path::PathBuf;

use crate::config::CarbonSettings;
use crate::error::{AppError, Result};
use crate::intensity;
use crate::services::AppServices;
use verdant_core::ScoreWeights;
use verdant_db::Db;

/// Storage locations and carbon model settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub intensity_defaults_path: PathBuf,
    pub carbon: CarbonSettings,
    pub score_weights: ScoreWeights,
}

impl AppConfig {
    pub fn new(db_path: PathBuf, intensity_defaults_path: PathBuf) -> Self {
        Self {
            db_path,
            intensity_defaults_path,
            carbon: CarbonSettings::default(),
            score_weights: ScoreWeights::default(),
        }
    }

    pub fn with_carbon(mut self, carbon: CarbonSettings) -> Self {
        self.carbon = carbon;
        self
    }

    pub fn with_score_weights(mut self, score_weights: ScoreWeights) -> Self {
        self.score_weights = score_weights;
        self
    }
}

/// Application state shared by the HTTP server and the CLI.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let services = AppServices::new(&config);
        Self { config, services }
    }

    pub fn is_fresh_db(&self) -> bool {
        !self.config.db_path.exists()
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    /// Migrates the database and seeds region intensities on first run.
    pub fn initialize(&self) -> Result<()> {
        let is_fresh_db = self.is_fresh_db();
        self.setup_db()
            .map_err(|err| AppError::Message(format!("initialize db: {}", err)))?;
        if is_fresh_db {
            self.apply_intensity_defaults()?;
        }
        self.sync_intensity_defaults()?;
        Ok(())
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }

    pub fn apply_intensity_defaults(&self) -> Result<()> {
        intensity::apply_intensity_defaults(
            &self.config.db_path,
            &self.config.intensity_defaults_path,
        )
    }

    pub fn sync_intensity_defaults(&self) -> Result<()> {
        intensity::sync_intensity_defaults(
            &self.config.db_path,
            &self.config.intensity_defaults_path,
        )
    }
}

pub fn setup_db(path: &std::path::Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
