//! Configuration module for loading environment variables and settings.

use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Base URL of the OpenAI video API.
pub const SORA_API_BASE: &str = "https://api.openai.com/v1";

/// Environment variable holding the bearer credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the default save directory.
pub const OUTPUT_DIR_VAR: &str = "SORA_OUTPUT_DIR";

/// Save directory used when `SORA_OUTPUT_DIR` is not set.
pub const DEFAULT_OUTPUT_DIR: &str = "./videos";

/// Environment variable holding the HTTP port.
pub const PORT_VAR: &str = "PORT";

/// HTTP port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 3000;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// OpenAI API key sent as a bearer token (required)
    pub api_key: String,
    /// Directory used by `save-video` when no `output_path` is given
    pub output_dir: PathBuf,
    /// HTTP server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEnvVar` if OPENAI_API_KEY is not set or empty,
    /// and `ConfigError::InvalidValue` if PORT is not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a closure over a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::missing_env_var(API_KEY_VAR))?;

        let output_dir = lookup(OUTPUT_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let port = match lookup(PORT_VAR).filter(|p| !p.trim().is_empty()) {
            Some(raw) => raw.trim().parse().map_err(|e| {
                ConfigError::invalid_value(PORT_VAR, format!("'{}' is not a port number: {}", raw, e))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            output_dir,
            port,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("port", &self.port)
            .finish()
    }
}
