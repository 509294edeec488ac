//! Configuration file – reads/writes `~/.busflow/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use busflow_sim::SimulationConfig;
use busflow_types::BusflowError;

/// Return the path to `~/.busflow/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".busflow").join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub fn load_from(path: &Path) -> Result<Option<SimulationConfig>, BusflowError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| BusflowError::Io(format!("failed to read {}: {}", path.display(), e)))?;
    let cfg = toml::from_str(&raw).map_err(|e| {
        BusflowError::InvalidConfig(format!("failed to parse {}: {}", path.display(), e))
    })?;
    Ok(Some(cfg))
}

/// Resolve the configuration for a run.
///
/// An explicit path must exist.  Without one, `~/.busflow/config.toml` is
/// used when present and the built-in defaults otherwise.  `BUSFLOW_*`
/// environment overrides are applied last.
pub fn resolve(explicit: Option<&Path>) -> Result<SimulationConfig, BusflowError> {
    let mut cfg = match explicit {
        Some(path) => load_from(path)?.ok_or_else(|| {
            BusflowError::Io(format!("config file {} not found", path.display()))
        })?,
        None => load_from(&config_path())?.unwrap_or_default(),
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Apply `BUSFLOW_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `BUSFLOW_SEED` | `seed` |
/// | `BUSFLOW_CAPACITY` | `capacity` |
/// | `BUSFLOW_VEHICLE_ID` | `vehicle_id` |
pub fn apply_env_overrides(cfg: &mut SimulationConfig) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`] with an injectable variable lookup.
/// Unparsable numbers are ignored.
pub(crate) fn apply_overrides(cfg: &mut SimulationConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("BUSFLOW_SEED")
        && let Ok(seed) = v.trim().parse::<u64>() {
            cfg.seed = seed;
        }
    if let Some(v) = lookup("BUSFLOW_CAPACITY")
        && let Ok(capacity) = v.trim().parse::<u32>() {
            cfg.capacity = capacity;
        }
    if let Some(v) = lookup("BUSFLOW_VEHICLE_ID") {
        cfg.vehicle_id = v;
    }
}

/// Write `cfg` as TOML to `path`, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn save_to(cfg: &SimulationConfig, path: &Path, force: bool) -> Result<(), BusflowError> {
    if path.exists() && !force {
        return Err(BusflowError::Io(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                BusflowError::Io(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| BusflowError::Serialization(format!("failed to serialize config: {}", e)))?;
    fs::write(path, raw)
        .map_err(|e| BusflowError::Io(format!("failed to write {}: {}", path.display(), e)))?;
    Ok(())
}
