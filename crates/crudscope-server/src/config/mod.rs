//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

pub use schema::{AppConfig, ServerSection, SimulationSection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config failed: {0}")]
    Read(String),
    #[error("invalid yaml: {0}")]
    Yaml(String),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub fn load_from_file(path: impl AsRef<Path>) -> Result<AppConfig> {
    let s = fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::Read(format!("{}: {e}", path.as_ref().display())))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<AppConfig> {
    match fs::read_to_string(path.as_ref()) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.as_ref().display(), "config file not found, using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(ConfigError::Read(format!("{}: {e}", path.as_ref().display()))),
    }
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s).map_err(|e| ConfigError::Yaml(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}
