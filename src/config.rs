//! Configuration file handling.
//!
//! This module provides loading and saving of depscan configuration
//! from a TOML file, plus the environment override for the expiration
//! window. The core modules never read the environment themselves; the
//! composition layer resolves a [`Config`] and injects plain values.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/depscan/config.toml`
//! - macOS: `~/Library/Application Support/depscan/config.toml`
//! - Windows: `%APPDATA%\depscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! expiration_secs = 604800
//! tool_path = "/var/cache/depscan/twistcli"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Seconds in one week, the default expiration window for the managed
/// scanner binary.
pub const SEC_IN_WEEK: u64 = 604_800;

/// Environment variable overriding `expiration_secs`.
pub const EXPIRATION_ENV_VAR: &str = "DEPSCAN_EXPIRATION_TIME_IN_SEC";

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use depscan::Config;
///
/// let config = Config::load().unwrap().with_env_override();
/// println!("Scanner binary: {}", config.tool_path.display());
/// println!("Expiration: {:?}", config.expiration());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long the cached scanner binary stays fresh, in seconds.
    ///
    /// Zero means the binary is always considered stale.
    /// Default: 604800 (one week)
    pub expiration_secs: u64,

    /// Where the managed scanner binary is cached.
    ///
    /// Default: `<cache_dir>/depscan/twistcli`
    pub tool_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expiration_secs: SEC_IN_WEEK,
            tool_path: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("depscan")
                .join("twistcli"),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies the `DEPSCAN_EXPIRATION_TIME_IN_SEC` override if set.
    ///
    /// The value is read on every call so tests and operators can change
    /// it at runtime. Unparseable values are ignored.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(value) = std::env::var(EXPIRATION_ENV_VAR) {
            if let Ok(secs) = value.trim().parse::<u64>() {
                self.expiration_secs = secs;
            }
        }
        self
    }

    /// The expiration window as a [`Duration`].
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    ///
    /// This is useful for showing users what the default config looks like.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
