use serde::{Deserialize, Serialize};
use verdant_core::DEFAULT_GRID_INTENSITY_G_PER_KWH;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RangeParams {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// How a budget alert is written relative to its emission record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDelivery {
    /// Record first, alert afterwards. A failed alert is logged and dropped.
    #[default]
    BestEffort,
    /// Record and alert share one transaction.
    Atomic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupMode {
    Inline,
    #[default]
    Background,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CarbonSettings {
    pub default_intensity_g_per_kwh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_budget_kg: Option<f64>,
    pub pue: f64,
    pub alert_delivery: AlertDelivery,
    pub rollup_mode: RollupMode,
}

impl Default for CarbonSettings {
    fn default() -> Self {
        Self {
            default_intensity_g_per_kwh: DEFAULT_GRID_INTENSITY_G_PER_KWH,
            default_budget_kg: None,
            pue: 1.0,
            alert_delivery: AlertDelivery::default(),
            rollup_mode: RollupMode::default(),
        }
    }
}
