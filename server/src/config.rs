//! Layered server configuration.
//!
//! Precedence, lowest first:
//! 1. Defaults (`127.0.0.1:3001`, `data/items.json`, 4 workers)
//! 2. TOML file passed with `--config`
//! 3. Environment (`CATALOG_BIND`, `CATALOG_DATA`, `CATALOG_WORKERS`)
//! 4. Command-line flags, applied by the caller
//!
//! ```toml
//! bind = "0.0.0.0:3001"
//! data_path = "/var/lib/catalog/items.json"
//! workers = 8
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub const ENV_BIND: &str = "CATALOG_BIND";
pub const ENV_DATA: &str = "CATALOG_DATA";
pub const ENV_WORKERS: &str = "CATALOG_WORKERS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error loading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for ${var}: '{value}' (expected: {expected})")]
    InvalidEnv {
        var: String,
        value: String,
        expected: String,
    },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address. Port 0 picks a free port.
    pub bind: SocketAddr,
    /// Catalog document.
    pub data_path: PathBuf,
    /// Worker threads serving requests.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3001)),
            data_path: PathBuf::from(catalog_store::DEFAULT_DATA_PATH),
            workers: 4,
        }
    }
}

impl ServerConfig {
    /// Defaults, then `file` if given, then the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_BIND) {
            self.bind = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_BIND.to_string(),
                value: value.clone(),
                expected: "socket address such as 127.0.0.1:3001".to_string(),
            })?;
        }
        if let Some(value) = lookup(ENV_DATA).filter(|v| !v.is_empty()) {
            self.data_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            self.workers = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_WORKERS.to_string(),
                value: value.clone(),
                expected: "positive integer".to_string(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Validation(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
