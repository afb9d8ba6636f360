//! Configuration loading from disk.
//!
//! A deployment keeps a base `config.toml` next to per-environment overlays
//! (`config.development.toml`, `config.production.toml`, ...). Overlay tables
//! are merged key by key into the base before deserializing.

use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `polygon.api_key`.
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "Parse error in {}: {}", path.display(), e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a single TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let table = read_table(path)?;
    finish(table, path)
}

/// Load `<dir>/config.toml` overlaid with `<dir>/config.<env>.toml` if present.
pub fn load_layered(dir: &Path, env: &str) -> Result<GatewayConfig, ConfigError> {
    let base_path = dir.join("config.toml");
    let mut table = read_table(&base_path)?;

    let env_path = dir.join(format!("config.{}.toml", env));
    if env_path.exists() {
        let overlay = read_table(&env_path)?;
        merge_tables(&mut table, overlay);
        tracing::debug!(path = %env_path.display(), "Applied environment overlay");
    } else {
        tracing::debug!(path = %env_path.display(), "No environment overlay found");
    }

    finish(table, &base_path)
}

fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    content
        .parse::<Table>()
        .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

fn finish(table: Table, path: &Path) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = Value::Table(table)
        .try_into()
        .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            config.polygon.api_key = key;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Recursively merge `overlay` into `base`; overlay values win.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let replacement = match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            base.insert(key, value);
        }
    }
}
