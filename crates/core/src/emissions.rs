use std::collections::HashMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::{IntensityEntry, round6};

/// Grid intensity used when no regional figure is known, in g CO2e per kWh.
pub const DEFAULT_GRID_INTENSITY_G_PER_KWH: f64 = 450.0;

/// Region figures shipped with the binary, used to seed a new store.
pub fn builtin_intensity_entries() -> Result<Vec<IntensityEntry>, serde_json::Error> {
    serde_json::from_str(include_str!("../initial-intensity.json"))
}

/// Source of regional grid carbon intensity, in grams CO2e per kWh.
///
/// `Ok(None)` means the region is unknown; store failures surface as `Err`.
pub trait IntensityLookup {
    type Error;

    fn grid_intensity(&self, cloud: &str, region_code: &str) -> Result<Option<f64>, Self::Error>;
}

/// In-memory intensity table keyed case-insensitively by (cloud, region).
#[derive(Debug, Clone, Default)]
pub struct IntensityTable {
    entries: HashMap<(String, String), f64>,
}

impl IntensityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[IntensityEntry]) -> Self {
        entries.iter().fold(Self::new(), |table, entry| {
            table.with_region(&entry.cloud, &entry.region_code, entry.g_per_kwh)
        })
    }

    pub fn with_region(mut self, cloud: &str, region_code: &str, g_per_kwh: f64) -> Self {
        self.entries.insert(table_key(cloud, region_code), g_per_kwh);
        self
    }
}

fn table_key(cloud: &str, region_code: &str) -> (String, String) {
    (cloud.to_ascii_lowercase(), region_code.to_ascii_lowercase())
}

impl IntensityLookup for IntensityTable {
    type Error = Infallible;

    fn grid_intensity(&self, cloud: &str, region_code: &str) -> Result<Option<f64>, Infallible> {
        Ok(self.entries.get(&table_key(cloud, region_code)).copied())
    }
}

/// Energy and emissions computed for one usage record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionEstimate {
    pub kwh: f64,
    pub co2e_kg: f64,
    pub intensity_g_per_kwh: f64,
}

pub fn resolve_intensity<L: IntensityLookup>(
    lookup: &L,
    cloud: &str,
    region_code: &str,
    default_g_per_kwh: f64,
) -> Result<f64, L::Error> {
    Ok(lookup
        .grid_intensity(cloud, region_code)?
        .unwrap_or(default_g_per_kwh))
}

/// Grams per kWh times kWh, converted to kilograms.
pub fn co2e_kg_from_kwh(kwh: f64, intensity_g_per_kwh: f64) -> f64 {
    round6(kwh * intensity_g_per_kwh / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_region_uses_default_intensity() {
        let table = IntensityTable::new().with_region("azure", "westeurope", 200.0);
        let intensity = resolve_intensity(&table, "azure", "eastus", 450.0).expect("lookup");
        assert_eq!(intensity, 450.0);
        assert_eq!(co2e_kg_from_kwh(0.066, intensity), 0.0297);
    }

    #[test]
    fn lookup_ignores_case() {
        let table = IntensityTable::new().with_region("Azure", "WestEurope", 200.0);
        let intensity = resolve_intensity(&table, "azure", "westeurope", 450.0).expect("lookup");
        assert_eq!(intensity, 200.0);
    }

    #[test]
    fn builtin_entries_cover_seeded_regions() {
        let entries = builtin_intensity_entries().expect("bundled table");
        let table = IntensityTable::from_entries(&entries);
        assert_eq!(
            table.grid_intensity("azure", "eastus").expect("lookup"),
            Some(350.0)
        );
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn from_entries_builds_table() {
        let table = IntensityTable::from_entries(&[IntensityEntry {
            cloud: "aws".to_string(),
            region_code: "us-east-1".to_string(),
            g_per_kwh: 380.0,
        }]);
        assert_eq!(
            table.grid_intensity("aws", "us-east-1").expect("lookup"),
            Some(380.0)
        );
        assert_eq!(table.grid_intensity("gcp", "us-east-1").expect("lookup"), None);
    }
}
