use serde::Deserialize;
use verdant_core::IntensityEntry;

#[derive(Debug, Deserialize, Default)]
pub struct EmptyRequest {}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RangeRequest {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GreenScoreRequest {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub target_kg_per_tb: Option<f64>,
    pub target_freshness_hours: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HotspotsRequest {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AlertsRequest {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RecordsRequest {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct IntensityReplaceRequest {
    pub entries: Vec<IntensityEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BudgetPutRequest {
    pub source: String,
    pub run_id: Option<String>,
    pub budget_kg: f64,
}

#[derive(Debug, Deserialize)]
pub struct BudgetDeleteRequest {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub path: String,
}
