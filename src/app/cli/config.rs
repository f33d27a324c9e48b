//! TOML configuration file loading
//!
//! The file is optional unless named with `--config-file`. Every section has
//! defaults, and values given on the command line win over the file.

use super::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::logging::{LogFormat, LoggingOptions};
use crate::core::retry::RetryPolicy;
use crate::execution::api::DEFAULT_JOB_PREFIX;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "plugctl";
const CONFIG_FILE: &str = "plugctl.toml";
const CATALOG_FILE: &str = "catalog.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {path}")]
    Missing { path: PathBuf },

    #[error("Error reading configuration file {path}: {cause}")]
    Read { path: PathBuf, cause: String },

    #[error("Error parsing configuration file {path}: {cause}")]
    Parse { path: PathBuf, cause: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<String> {
        Some(self.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSettings {
    pub program: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSettings {
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub job_prefix: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
            job_prefix: DEFAULT_JOB_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSettings {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    pub file: Option<String>,
}

/// Resolved application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub container: ContainerSettings,
    pub remote: RemoteSettings,
    pub probe: ProbeSettings,
    pub logging: LoggingSettings,
}

/// `<config_dir>/plugctl/plugctl.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

impl Settings {
    /// Load settings from an explicit file, or the default file when present
    pub async fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Missing {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ConfigError::Read {
                    path: path.clone(),
                    cause: e.to_string(),
                })?;
        let settings = Self::from_toml_str(&contents).map_err(|cause| ConfigError::Parse {
            path: path.clone(),
            cause,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let settings: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        Ok(settings)
    }

    /// Apply command-line overrides
    pub fn merge_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(path) = &args.catalog {
            self.catalog.path = Some(path.clone());
        }
        if let Some(program) = &args.container_program {
            self.container.program = program.clone();
        }
        if let Some(url) = &args.remote_url {
            self.remote.url = Some(url.clone());
        }
        if let Some(level) = &args.log_level {
            self.logging.level = Some(level.clone());
        }
        if let Some(format) = &args.log_format {
            let parsed = format.parse::<LogFormat>().map_err(|_| ConfigError::Invalid {
                field: "logging.format",
                reason: format!("unknown log format '{}'", format),
            })?;
            self.logging.format = Some(parsed);
        }
        if let Some(file) = &args.log_file {
            self.logging.file = Some(file.clone());
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.container.program.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "container.program",
                reason: "must not be empty".to_string(),
            });
        }
        if self.probe.attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "probe.attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "remote.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Catalog file, defaulting to `<data_dir>/plugctl/catalog.json`
    pub fn catalog_path(&self) -> PathBuf {
        match &self.catalog.path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR).join(CATALOG_FILE))
                .unwrap_or_else(|| PathBuf::from(CATALOG_FILE)),
        }
    }

    pub fn remote_url(&self) -> Result<&str, ConfigError> {
        self.remote
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::Invalid {
                field: "remote.url",
                reason: "a remote backend URL is required for this operation".to_string(),
            })
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    pub fn probe_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.probe.attempts, Duration::from_millis(self.probe.delay_ms))
    }

    pub fn logging_options(&self, color: bool) -> LoggingOptions {
        LoggingOptions {
            level: self
                .logging
                .level
                .clone()
                .unwrap_or_else(|| "info".to_string()),
            format: self.logging.format.unwrap_or_default(),
            file: self.logging.file.clone(),
            color,
        }
    }
}
