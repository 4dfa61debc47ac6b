use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{AppError, Result};
use verdant_core::IntensityEntry;
use verdant_db::Db;

/// Seeds the region table from the user's defaults file, or the bundled
/// table when there is none.
pub fn apply_intensity_defaults(db_path: &Path, defaults_path: &Path) -> Result<()> {
    let entries = if defaults_path.exists() {
        load_intensity_defaults(defaults_path)?
    } else {
        load_initial_intensity()?
    };
    let mut db = Db::open(db_path)?;
    let count = db.replace_intensities(&entries)?;
    tracing::info!(count, "seeded region intensities");
    Ok(())
}

/// Mirrors the stored region table into the defaults file.
pub fn sync_intensity_defaults(db_path: &Path, defaults_path: &Path) -> Result<()> {
    let db = Db::open(db_path)?;
    let entries = db.list_intensities()?;
    if entries.is_empty() && !defaults_path.exists() {
        return Ok(());
    }
    write_intensity_defaults(defaults_path, &entries)
}

pub fn load_intensity_defaults(path: &Path) -> Result<Vec<IntensityEntry>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(AppError::from)
}

pub fn load_initial_intensity() -> Result<Vec<IntensityEntry>> {
    verdant_core::builtin_intensity_entries().map_err(AppError::from)
}

pub fn write_intensity_defaults(path: &Path, entries: &[IntensityEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, entries).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_table_covers_seeded_regions() {
        let entries = load_initial_intensity().expect("bundled table");
        let eastus = entries
            .iter()
            .find(|entry| entry.region_code == "eastus")
            .expect("eastus");
        assert_eq!(eastus.g_per_kwh, 350.0);
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn defaults_file_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested/intensity.json");
        let entries = vec![IntensityEntry {
            cloud: "aws".to_string(),
            region_code: "us-east-1".to_string(),
            g_per_kwh: 380.0,
        }];
        write_intensity_defaults(&path, &entries).expect("write");
        assert_eq!(load_intensity_defaults(&path).expect("load"), entries);
    }
}
