use serde::Serialize;
use verdant_app::{IngestAlert, IngestOutcome, SettingsSnapshot};

/// Ingestion reply. Field names are part of the collector contract.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    pub id: i64,
    #[serde(rename = "estKWh")]
    pub est_kwh: f64,
    #[serde(rename = "estCo2eKg")]
    pub est_co2e_kg: f64,
    #[serde(rename = "gridIntensity_g_per_kWh")]
    pub grid_intensity_g_per_kwh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<IngestAlert>,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            ok: true,
            id: outcome.id,
            est_kwh: outcome.est_kwh,
            est_co2e_kg: outcome.est_co2e_kg,
            grid_intensity_g_per_kwh: outcome.intensity_used,
            alert: outcome.alert,
        }
    }
}

#[derive(Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: SettingsSnapshot,
    pub app_data_dir: String,
    pub intensity_defaults_path: String,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: i64,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
