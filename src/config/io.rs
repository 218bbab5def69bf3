use std::path::{Path, PathBuf};

use serde::de::Error as SerdeDeError;

use super::types::{ConfigError, RaincastConfig};
use crate::app_dirs;
use crate::fs_ops::atomic_write;

/// Default filename of the config inside the app root.
pub const CONFIG_FILE_NAME: &str = "raincast.toml";

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load `raincast.toml` from the app root, returning defaults if it is missing.
pub fn load_or_default() -> Result<RaincastConfig, ConfigError> {
    load_from(&config_path()?)
}

/// Load a config file, returning defaults if `path` does not exist.
pub fn load_from(path: &Path) -> Result<RaincastConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}; using defaults", path.display());
        return Ok(RaincastConfig::default());
    }
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    let config: RaincastConfig =
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config.normalized())
}

/// Persist configuration to the app root.
pub fn save(config: &RaincastConfig) -> Result<(), ConfigError> {
    save_to_path(config, &config_path()?)
}

/// Write the TOML file atomically, creating parent directories as needed.
pub fn save_to_path(config: &RaincastConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
