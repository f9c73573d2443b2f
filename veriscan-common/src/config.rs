//! Configuration resolution for VeriScan services
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest)
//! 2. Environment variable (`VERISCAN_*`)
//! 3. TOML config file (`~/.config/veriscan/veriscan.toml`)
//! 4. Compiled default (fallback)
//!
//! The resolved [`Config`] is an explicit value handed to constructors;
//! nothing in the system reads configuration ambiently after startup.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Deployment mode controlling degraded-mode workflow substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Live deployment: upstream failures always propagate
    Production,
    /// Development: upstream failures may substitute canned responses
    Development,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentMode::Production => "production",
            DeploymentMode::Development => "development",
        }
    }
}

impl std::str::FromStr for DeploymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(DeploymentMode::Production),
            "development" | "dev" => Ok(DeploymentMode::Development),
            other => Err(Error::Config(format!(
                "Unknown deployment mode '{}' (expected 'production' or 'development')",
                other
            ))),
        }
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Directory uploaded images are written to (and served from)
    pub uploads_dir: PathBuf,
    /// Base URL of the external workflow engine webhooks
    pub workflow_base_url: String,
    /// Deployment mode (controls canned-response fallback)
    pub mode: DeploymentMode,
    /// Session token lifetime in days
    pub token_ttl_days: i64,
}

/// Optional per-setting overrides (CLI arguments, environment)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub workflow_base_url: Option<String>,
    pub mode: Option<DeploymentMode>,
    pub token_ttl_days: Option<i64>,
}

impl Overrides {
    /// Collect overrides from `VERISCAN_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mode = match std::env::var("VERISCAN_MODE") {
            Ok(value) => Some(value.parse()?),
            Err(_) => None,
        };

        let token_ttl_days = match std::env::var("VERISCAN_TOKEN_TTL_DAYS") {
            Ok(value) => Some(value.parse::<i64>().map_err(|_| {
                Error::Config(format!("VERISCAN_TOKEN_TTL_DAYS is not a number: {}", value))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            bind_addr: std::env::var("VERISCAN_BIND").ok(),
            database_path: std::env::var("VERISCAN_DB").ok().map(PathBuf::from),
            uploads_dir: std::env::var("VERISCAN_UPLOADS").ok().map(PathBuf::from),
            workflow_base_url: std::env::var("VERISCAN_WORKFLOW_URL").ok(),
            mode,
            token_ttl_days,
        })
    }

    /// Merge two override sets; `self` wins where both are present
    pub fn or(self, lower: Overrides) -> Overrides {
        Overrides {
            bind_addr: self.bind_addr.or(lower.bind_addr),
            database_path: self.database_path.or(lower.database_path),
            uploads_dir: self.uploads_dir.or(lower.uploads_dir),
            workflow_base_url: self.workflow_base_url.or(lower.workflow_base_url),
            mode: self.mode.or(lower.mode),
            token_ttl_days: self.token_ttl_days.or(lower.token_ttl_days),
        }
    }
}

/// On-disk TOML configuration schema
///
/// Every field is optional; missing files or fields fall through to defaults
/// rather than aborting startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub workflow_base_url: Option<String>,
    pub mode: Option<String>,
    pub token_ttl_days: Option<i64>,
}

impl TomlConfig {
    fn into_overrides(self) -> Result<Overrides> {
        let mode = match self.mode {
            Some(value) => Some(value.parse()?),
            None => None,
        };

        Ok(Overrides {
            bind_addr: self.bind_addr,
            database_path: self.database_path,
            uploads_dir: self.uploads_dir,
            workflow_base_url: self.workflow_base_url,
            mode,
            token_ttl_days: self.token_ttl_days,
        })
    }
}

/// Default config file location: `<config dir>/veriscan/veriscan.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("veriscan").join("veriscan.toml"))
}

/// Load the TOML config file if present; a missing file is not an error
pub fn load_toml_config(path: Option<&PathBuf>) -> Result<TomlConfig> {
    let path = match path.cloned().or_else(default_config_path) {
        Some(p) => p,
        None => return Ok(TomlConfig::default()),
    };

    if !path.exists() {
        tracing::debug!("No config file at {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("veriscan"))
        .unwrap_or_else(|| PathBuf::from("./veriscan_data"))
}

impl Config {
    /// Resolve configuration from CLI overrides, environment, and TOML file
    pub fn resolve(cli: Overrides, config_file: Option<&PathBuf>) -> Result<Config> {
        let env = Overrides::from_env()?;
        let toml = load_toml_config(config_file)?.into_overrides()?;
        Ok(Self::from_overrides(cli.or(env).or(toml)))
    }

    /// Apply compiled defaults to whatever the higher tiers left unset
    pub fn from_overrides(overrides: Overrides) -> Config {
        let data_dir = default_data_dir();

        Config {
            bind_addr: overrides
                .bind_addr
                .unwrap_or_else(|| "127.0.0.1:5800".to_string()),
            database_path: overrides
                .database_path
                .unwrap_or_else(|| data_dir.join("veriscan.db")),
            uploads_dir: overrides
                .uploads_dir
                .unwrap_or_else(|| data_dir.join("uploads")),
            workflow_base_url: overrides
                .workflow_base_url
                .unwrap_or_else(|| "http://localhost:5678/webhook".to_string()),
            mode: overrides.mode.unwrap_or(DeploymentMode::Development),
            token_ttl_days: overrides.token_ttl_days.unwrap_or(7),
        }
    }

    /// Create the data directories this config points at
    pub fn ensure_directories(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.uploads_dir)?;
        Ok(())
    }
}
