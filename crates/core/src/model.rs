use crate::emissions::{DEFAULT_GRID_INTENSITY_G_PER_KWH, co2e_kg_from_kwh, resolve_intensity};
use crate::energy::{PowerTable, estimate_energy_kwh};
use crate::{EmissionEstimate, IntensityLookup, PowerDrawLookup, UsageRecord};

/// Energy and emissions model with its reference data injected.
#[derive(Debug, Clone)]
pub struct CarbonModel<P = PowerTable> {
    pub power: P,
    pub pue: f64,
    pub default_intensity_g_per_kwh: f64,
}

impl CarbonModel {
    pub fn new(default_intensity_g_per_kwh: f64) -> Self {
        Self {
            power: PowerTable::builtin(),
            pue: 1.0,
            default_intensity_g_per_kwh,
        }
    }
}

impl Default for CarbonModel {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_INTENSITY_G_PER_KWH)
    }
}

impl<P: PowerDrawLookup> CarbonModel<P> {
    pub fn with_power_table<Q: PowerDrawLookup>(self, power: Q) -> CarbonModel<Q> {
        CarbonModel {
            power,
            pue: self.pue,
            default_intensity_g_per_kwh: self.default_intensity_g_per_kwh,
        }
    }

    pub fn with_pue(mut self, pue: f64) -> Self {
        self.pue = pue;
        self
    }

    pub fn estimate_energy_kwh(&self, record: &UsageRecord) -> f64 {
        estimate_energy_kwh(record, &self.power, self.pue)
    }

    /// Energy, emissions and the grid intensity they were computed with.
    pub fn compute_emissions<L: IntensityLookup>(
        &self,
        record: &UsageRecord,
        intensity: &L,
    ) -> Result<EmissionEstimate, L::Error> {
        let kwh = self.estimate_energy_kwh(record);
        let intensity_g_per_kwh = resolve_intensity(
            intensity,
            &record.cloud,
            &record.region_code,
            self.default_intensity_g_per_kwh,
        )?;
        Ok(EmissionEstimate {
            kwh,
            co2e_kg: co2e_kg_from_kwh(kwh, intensity_g_per_kwh),
            intensity_g_per_kwh,
        })
    }
}
