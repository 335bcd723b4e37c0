//! Configuration management for the file drop server
//!
//! Loaded once at startup from `config.toml` with environment overrides and
//! shared read-only afterwards.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::ExtensionPolicy;

/// Locations tried for the optional configuration file
const CONFIG_PATHS: [&str; 2] = [
    "file-drop/config", // Docker production: /app/file-drop/config.toml
    "config",           // Local development: ./config.toml
];

/// Environment variables override file values, e.g. `FILEDROP_UPLOAD_FOLDER`
const ENV_PREFIX: &str = "FILEDROP";

/// Complete server configuration. Every value requires a restart to change.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    pub bind_address: String,
    pub port: u16,

    /// Root directory for every stored file
    pub upload_folder: String,

    /// Comma-separated extension allow-list; unset accepts every extension
    pub supported_extensions: Option<String>,

    /// External base address used in download URLs; defaults to the request host
    pub public_url: Option<String>,

    /// Largest accepted request body in MB
    pub max_upload_size_mb: u64,
    pub request_timeout_secs: u64,

    /// Tokio worker threads, 0 uses one per CPU
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            upload_folder: "/tmp/uploaded".to_string(),
            supported_extensions: None,
            public_url: None,
            max_upload_size_mb: 100,
            request_timeout_secs: 600,
            workers: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        for config_path in CONFIG_PATHS {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.upload_folder.trim().is_empty() {
            return Err(ConfigError::Message("upload_folder cannot be empty".into()));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(url) = &self.public_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Message(format!(
                    "public_url must start with http:// or https://, got {url}"
                )));
            }
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Upload folder as an absolute path
    pub fn upload_root(&self) -> io::Result<PathBuf> {
        std::path::absolute(&self.upload_folder)
    }

    pub fn extension_policy(&self) -> ExtensionPolicy {
        self.supported_extensions
            .as_deref()
            .map(ExtensionPolicy::parse)
            .unwrap_or_default()
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> usize {
        usize::try_from(self.max_upload_size_mb * 1024 * 1024).unwrap_or(usize::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
