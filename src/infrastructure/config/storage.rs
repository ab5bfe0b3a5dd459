//! Locating and reading the TOML config file.

use super::app_config::AppConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from an existing file.
    File,
    /// No file existed; defaults were written to it.
    Created,
    /// The file did not parse; defaults are used and the file is untouched.
    Fallback { reason: String },
}

/// A configuration together with the file it belongs to.
///
/// Config is loaded before logging is set up, so the origin is handed back
/// for the caller to report.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub origin: ConfigOrigin,
}

pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Uses the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigDirNotFound` when the platform has no
    /// home directory.
    pub fn new() -> Result<Self, ConfigError> {
        AppConfig::default_config_dir()
            .map(Self::with_dir)
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    #[must_use]
    pub const fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// The file read when no `--config` override is given.
    #[must_use]
    pub fn default_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Reads the config at `path_override`, or at the default path.
    ///
    /// A missing file is created with defaults. A malformed file is kept
    /// as it is and defaults are used for this run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or created.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let path = path_override.map_or_else(|| self.default_path(), Path::to_path_buf);

        if !path.exists() {
            let config = AppConfig::default();
            write_atomically(&path, &config)?;
            return Ok(LoadedConfig {
                config,
                path,
                origin: ConfigOrigin::Created,
            });
        }

        let content = fs::read_to_string(&path)?;
        let (config, origin) = match toml::from_str::<AppConfig>(&content) {
            Ok(config) => (config, ConfigOrigin::File),
            Err(e) => (
                AppConfig::default(),
                ConfigOrigin::Fallback {
                    reason: e.to_string(),
                },
            ),
        };
        Ok(LoadedConfig {
            config,
            path,
            origin,
        })
    }
}

/// Writes through a temp file in the same directory so a crash never
/// leaves a half-written config behind.
fn write_atomically(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
