//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::{KnownEntities, RiskPolicy, WhaleThresholds};
use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub entities: EntitiesConfig,
    #[serde(default)]
    pub risk_policy: RiskPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Whale and alert thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Holders worth at least this much USD are whales
    #[serde(default = "default_whale_threshold_usd")]
    pub whale_threshold_usd: f64,
    /// Holders with at least this percent of supply are whales
    #[serde(default = "default_whale_threshold_percent")]
    pub whale_threshold_percent: f64,
    /// Transfers of at least this much USD raise an alert
    #[serde(default = "default_alert_threshold_usd")]
    pub alert_threshold_usd: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            whale_threshold_usd: default_whale_threshold_usd(),
            whale_threshold_percent: default_whale_threshold_percent(),
            alert_threshold_usd: default_alert_threshold_usd(),
        }
    }
}

impl AnalysisConfig {
    /// Thresholds must be finite; the alert threshold must be positive
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("whale_threshold_usd", self.whale_threshold_usd),
            ("whale_threshold_percent", self.whale_threshold_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.whale_threshold_percent > 100.0 {
            return Err(Error::Config(
                "whale_threshold_percent cannot exceed 100".to_string(),
            ));
        }

        if !self.alert_threshold_usd.is_finite() || self.alert_threshold_usd <= 0.0 {
            return Err(Error::Config("alert_threshold_usd must be positive".to_string()));
        }

        Ok(())
    }

    pub fn whale_thresholds(&self) -> WhaleThresholds {
        WhaleThresholds {
            usd: self.whale_threshold_usd,
            percent: self.whale_threshold_percent,
        }
    }
}

/// Known exchange/DEX address table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitiesConfig {
    /// Start from the built-in exchange table
    #[serde(default = "default_true")]
    pub include_builtin: bool,
    /// Extra JSON table merged over the built-in one
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            path: None,
        }
    }
}

impl EntitiesConfig {
    /// Build the entity table in effect
    pub fn load_entities(&self) -> Result<KnownEntities> {
        let base = if self.include_builtin {
            KnownEntities::builtin()
        } else {
            KnownEntities::new()
        };

        match &self.path {
            Some(path) => {
                let extra = KnownEntities::from_json_file(path)
                    .with_context(|| format!("Failed to load entity table {}", path.display()))?;
                Ok(base.merge(extra))
            }
            None => Ok(base),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level for this crate when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_whale_threshold_usd() -> f64 { 100_000.0 }
fn default_whale_threshold_percent() -> f64 { 1.0 }
fn default_alert_threshold_usd() -> f64 { 50_000.0 }

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("analysis.whale_threshold_usd", default_whale_threshold_usd())?
            .set_default("analysis.whale_threshold_percent", default_whale_threshold_percent())?
            .set_default("analysis.alert_threshold_usd", default_alert_threshold_usd())?
            .set_default("entities.include_builtin", default_true())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix HOLDER_MONITOR)
            .add_source(
                config::Environment::with_prefix("HOLDER_MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;

        self.risk_policy
            .validate()
            .context("Invalid risk_policy section")?;

        if let Some(path) = &self.entities.path {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "Entity table file does not exist");
            }
        }

        Ok(())
    }

    /// Short human-readable summary
    pub fn summary(&self) -> String {
        let weights = &self.risk_policy.weights;
        format!(
            r#"Configuration:
  Analysis:
    whale_threshold_usd: {}
    whale_threshold_percent: {}%
    alert_threshold_usd: {}
  Entities:
    include_builtin: {}
    path: {}
  Risk policy:
    version: {}
    window: {}h
    weights: centralization={} whale_behavior={} exchange={} transfer={}
  Logging:
    level: {}
    json: {}"#,
            self.analysis.whale_threshold_usd,
            self.analysis.whale_threshold_percent,
            self.analysis.alert_threshold_usd,
            self.entities.include_builtin,
            self.entities
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
            self.risk_policy.version,
            self.risk_policy.window_hours,
            weights.centralization,
            weights.whale_behavior,
            weights.exchange,
            weights.transfer,
            self.logging.level,
            self.logging.json,
        )
    }
}
