//! Configuration for clipshift.
//!
//! Loaded from an explicit path, ./.clipshift.yml or
//! ~/.config/clipshift/clipshift.yml, falling back to defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paste::{Key, RecoveryPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub log_level: Option<String>,
    pub paste: PasteSettings,
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            paste: PasteSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

/// Keys used for the simulated paste gesture and the failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PasteSettings {
    pub modifier_key: Key,
    pub letter_key: Key,
    pub recovery: RecoveryPolicy,
}

impl Default for PasteSettings {
    fn default() -> Self {
        Self {
            modifier_key: Key::LeftCtrl,
            letter_key: Key::V,
            recovery: RecoveryPolicy::Leave,
        }
    }
}

/// Attempt budget and interval for retrying jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetrySettings {
    pub attempts_before_failing: u32,
    pub interval_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts_before_failing: 3,
            interval_ms: 100,
        }
    }
}

impl RetrySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .clipshift.yml in current directory
    /// 3. ~/.config/clipshift/clipshift.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        let project_config = PathBuf::from(format!(".{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", project_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.retry.attempts_before_failing == 0 {
            eyre::bail!("retry.attempts-before-failing must be > 0");
        }
        if self.paste.modifier_key == self.paste.letter_key {
            eyre::bail!("paste.modifier-key and paste.letter-key must differ");
        }
        Ok(())
    }

    /// Render the configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}
