use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "verdantops";

/// Flag or environment first, then the config file, then the per-user
/// data directory.
pub fn resolve_data_dir(
    flag: Option<&Path>,
    configured: Option<&Path>,
) -> Result<PathBuf, String> {
    if let Some(dir) = flag.or(configured) {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var("XDG_DATA_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir).join(DATA_DIR_NAME));
        }
    }
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(DATA_DIR_NAME))
}
