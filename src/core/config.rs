use crate::core::allocation::DEFAULT_HISTORY_DAYS;
use crate::providers::yahoo_finance::DEFAULT_BASE_URL;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Smallest investment the CLI accepts.
pub const DEFAULT_MIN_INVESTMENT: f64 = 5000.0;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        YahooProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub yahoo: YahooProviderConfig,
}

fn default_min_investment() -> f64 {
    DEFAULT_MIN_INVESTMENT
}

fn default_history_days() -> u32 {
    DEFAULT_HISTORY_DAYS
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_min_investment")]
    pub min_investment: f64,
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            min_investment: DEFAULT_MIN_INVESTMENT,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if none exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "stocksuggest", "stocksuggest")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.history_days < 2 {
            bail!(
                "history_days must be at least 2, got {}",
                self.history_days
            );
        }
        if !self.min_investment.is_finite() || self.min_investment < 0.0 {
            bail!(
                "min_investment must be a non-negative number, got {}",
                self.min_investment
            );
        }
        Ok(())
    }
}
