//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use recap_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// CLI configuration, read from `~/.recap/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Extraction runner settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite database path; defaults to `~/.recap/recap.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (IDs only) format
    Quiet,
}

impl Config {
    /// Directory holding the configuration and the default database.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".recap"))
    }

    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, writing the defaults there first if
    /// the file does not exist yet.
    ///
    /// Failing to write the defaults is logged and the defaults are used.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            match Self::default().save_to(path) {
                Ok(()) => debug!("Wrote default configuration to {}", path.display()),
                Err(e) => warn!("Could not write {}: {}", path.display(), e),
            }
        }
        Self::load_from(path)
    }

    /// Load configuration from `path`, or defaults if it is absent.
    ///
    /// `RECAP_*` environment variables override the extractor section.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        self.extractor = self
            .extractor
            .with_env_overrides()
            .map_err(CliError::Config)?;
        Ok(self)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Database path: the explicit override, then the setting, then the default.
    pub fn database_path(&self, overridden: Option<PathBuf>) -> Result<PathBuf> {
        match overridden.or_else(|| self.settings.database.clone()) {
            Some(path) => Ok(path),
            None => Ok(Self::dir()?.join("recap.db")),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
