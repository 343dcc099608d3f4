//! Configuration loading for muninnd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.muninn/config.toml` (user)
//! 3. `/etc/muninn/config.toml` (system)
//!
//! If none exists, built-in defaults are used.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.muninn/secrets.toml` (user, must be 0600)
//! 2. `/etc/muninn/secrets.toml` (system, must be 0600)

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::cache::CacheConfig;
use crate::oracle::RetryConfig;
use crate::pricing::Catalog;
use crate::{MuninnError, Result};

/// Environment variable holding the oracle token when no secrets file does.
pub const ORACLE_TOKEN_ENV: &str = "MUNINN_ORACLE_TOKEN";

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub catalog: Catalog,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Pricing oracle connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Oracle base URL (default: http://localhost:8080).
    #[serde(default = "default_oracle_url")]
    pub base_url: String,
    /// Per-request deadline in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Attempts per oracle call, 1 = no retry (default: 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new().max_attempts(self.max_attempts)
    }
}

fn default_oracle_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

/// `[cache]` section, converted into a [`CacheConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// How long a price is served, in seconds (default: 300).
    #[serde(default = "default_duration")]
    pub duration_secs: u64,
    /// Refresh-candidate age in seconds (default: half of `duration_secs`).
    #[serde(default)]
    pub refresh_candidate_age_secs: Option<u64>,
    /// Window retention in seconds (default: 1800).
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
    /// Identifiers per oracle call, target included (default: 10).
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Store capacity (default: 10,000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            refresh_candidate_age_secs: None,
            max_age_secs: default_max_age(),
            max_batch_size: default_max_batch_size(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_duration() -> u64 {
    300
}

fn default_max_age() -> u64 {
    1800
}

fn default_max_batch_size() -> usize {
    10
}

fn default_max_entries() -> u64 {
    10_000
}

impl From<CacheSection> for CacheConfig {
    fn from(section: CacheSection) -> Self {
        let mut config = CacheConfig::new()
            .cache_duration(Duration::from_secs(section.duration_secs))
            .max_age(Duration::from_secs(section.max_age_secs))
            .max_batch_size(section.max_batch_size)
            .max_entries(section.max_entries);
        if let Some(secs) = section.refresh_candidate_age_secs {
            config = config.refresh_candidate_age(Duration::from_secs(secs));
        }
        config
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub oracle: Option<TokenSecret>,
}

/// A single token secret.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSecret {
    pub token: String,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.muninn/config.toml`
    /// 3. `/etc/muninn/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MuninnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MuninnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MuninnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".muninn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/muninn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.muninn/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/muninn/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (the token may come from env).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".muninn").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/muninn/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Parse a secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            MuninnError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MuninnError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            MuninnError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(MuninnError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        // Permission check not available on non-Unix platforms
        Ok(())
    }

    /// Oracle token, falling back to [`ORACLE_TOKEN_ENV`].
    pub fn oracle_token(&self) -> Option<String> {
        self.oracle
            .as_ref()
            .map(|s| s.token.clone())
            .or_else(|| std::env::var(ORACLE_TOKEN_ENV).ok())
    }
}
