pub mod app;
pub mod config;
pub mod error;
pub mod intensity;
pub mod services;
pub mod startup;
pub mod util;

pub use app::{AppConfig, AppState};
pub use config::{AlertDelivery, CarbonSettings, RangeParams, RollupMode};
pub use error::{ApiError, AppError, Result};
pub use intensity::{
    apply_intensity_defaults, load_initial_intensity, load_intensity_defaults,
    sync_intensity_defaults, write_intensity_defaults,
};
pub use services::{AppServices, IngestAlert, IngestOutcome, SettingsSnapshot};
pub use startup::{AppPaths, ensure_app_data_dir};
pub use util::time::{normalize_rfc3339_to_utc, resolve_range, resolve_range_at};
