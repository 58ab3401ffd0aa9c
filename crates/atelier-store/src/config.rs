// ABOUTME: Configuration loading for the atelier persistence layer.
// ABOUTME: Reads ATELIER_* environment variables with defaults and validates the run mode.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::paths::resolve_data_root;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ATELIER_MODE must be one of development, desktop, server; got {0:?}")]
    InvalidMode(String),
}

/// How the application was launched; decides where the data root lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Running from a source checkout: data lives next to the working directory.
    Development,
    /// Packaged desktop app.
    #[default]
    Desktop,
    /// Headless web server.
    Server,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "desktop" => Ok(Self::Desktop),
            "server" => Ok(Self::Server),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Desktop => "desktop",
            Self::Server => "server",
        };
        f.write_str(name)
    }
}

/// Persistence configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AtelierConfig {
    pub mode: RunMode,
    pub data_dir: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub sweep_temps: bool,
}

impl AtelierConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - ATELIER_MODE: development | desktop | server (default: desktop)
    /// - ATELIER_DATA_DIR: explicit data root, overrides the mode's location
    /// - ATELIER_SWEEP_TEMPS: remove stale temp files at startup (default: true)
    /// - HOME: base for the desktop and server data roots
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match lookup("ATELIER_MODE").filter(|m| !m.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => RunMode::default(),
        };

        let data_dir = lookup("ATELIER_DATA_DIR")
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);

        let home = lookup("HOME").filter(|h| !h.is_empty()).map(PathBuf::from);

        let sweep_temps = lookup("ATELIER_SWEEP_TEMPS")
            .map(|v| !matches!(v.trim(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(Self {
            mode,
            data_dir,
            home,
            sweep_temps,
        })
    }

    /// The absolute data root for this configuration.
    pub fn data_root(&self, cwd: &Path) -> PathBuf {
        resolve_data_root(
            self.mode,
            self.data_dir.as_deref(),
            self.home.as_deref(),
            cwd,
        )
    }
}
