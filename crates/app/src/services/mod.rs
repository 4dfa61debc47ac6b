mod analytics;
mod ingest;
mod reference;
mod settings;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::Result;
use verdant_db::Db;

pub use analytics::AnalyticsService;
pub use ingest::{IngestAlert, IngestOutcome, IngestService};
pub use reference::ReferenceService;
pub use settings::{SettingsService, SettingsSnapshot};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub analytics: AnalyticsService,
    pub ingest: IngestService,
    pub reference: ReferenceService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            analytics: AnalyticsService::new(shared.clone()),
            ingest: IngestService::new(shared.clone()),
            reference: ReferenceService::new(shared.clone()),
            settings: SettingsService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}
