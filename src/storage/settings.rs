use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::settings::Settings;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_FILE: &str = "piano-finder.yaml";

pub fn save(settings: &Settings, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let data = serde_yaml::to_string(settings)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

pub fn open(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let settings: Settings =
        serde_yaml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(settings)
}

/// An explicit path must load; otherwise fall back to `piano-finder.yaml`
/// in the working directory, then to defaults.
pub fn load(explicit: Option<&Path>) -> Result<(Settings, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((open(path)?, Some(path.to_path_buf())));
    }
    let local = PathBuf::from(DEFAULT_FILE);
    if local.exists() {
        let settings = open(&local)?;
        return Ok((settings, Some(local)));
    }
    Ok((Settings::default(), None))
}
