// Configuration loading and parsing (client.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::params::{DAYS_RANGE, LIMIT_RANGE, POOL_SIZE_RANGE};

const CONFIG_FILE: &str = "client.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// client.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Origin the client was served from. Falls back to the local API when
    /// absent or not an http(s) URL.
    #[serde(default)]
    pub origin: Option<String>,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Initial values for the Parameter Store.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDefaults {
    pub days: u32,
    pub pool_size: u32,
    pub limit: u32,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        SessionDefaults {
            days: 7,
            pool_size: 300,
            limit: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/client.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` handles that.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/client.toml` into `config/` when it is missing there.
/// Returns the files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let source = defaults_dir.join(CONFIG_FILE);
    let target = config_dir.join(CONFIG_FILE);
    if !source.is_file() || target.exists() {
        return Ok(vec![]);
    }

    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;

    Ok(vec![target])
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    let s = &config.session;
    let ranged: &[(&str, u32, &std::ops::RangeInclusive<u32>)] = &[
        ("session.days", s.days, &DAYS_RANGE),
        ("session.pool_size", s.pool_size, &POOL_SIZE_RANGE),
        ("session.limit", s.limit, &LIMIT_RANGE),
    ];
    for (name, val, range) in ranged {
        if !range.contains(val) {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!(
                    "must be between {} and {} inclusive, got {val}",
                    range.start(),
                    range.end()
                ),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
