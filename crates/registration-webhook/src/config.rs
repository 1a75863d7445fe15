//! Configuration for the registration webhook.

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listener and shared secret
    pub web: WebConfig,

    /// Registrant storage configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Shared secret expected in the `api-key` header
    pub api_key: SecretString,

    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the registrant JSON file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, registrants are in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Console log level
    #[serde(default = "default_console_level")]
    pub level: String,

    /// Emit console logs as JSON
    #[serde(default)]
    pub json: bool,

    /// Operator log file; an empty path disables it
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    /// Log level for the log file
    #[serde(default = "default_log_level")]
    pub file_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_console_level(),
            json: false,
            file: default_log_file(),
            file_level: default_log_level(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_store_path() -> PathBuf {
    PathBuf::from("registrants.json")
}

fn default_true() -> bool {
    true
}

fn default_console_level() -> String {
    "warn".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("web.log"))
}

impl LogConfig {
    /// Path of the operator log file, if enabled.
    pub fn file_path(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Variables use `__` between sections, e.g. `WEB__API_KEY`, `WEB__PORT`.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(false),
        )
    }

    /// Build configuration from a single source.
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.web.api_key.expose_secret().trim().is_empty() {
            bail!("web.api_key must not be empty");
        }
        Ok(())
    }
}
