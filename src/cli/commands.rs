//! CLI command implementations

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::analysis::{AlertSeverity, HolderAnalyzer, HolderSnapshot};
use crate::config::Config;

/// Threshold overrides given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdOverrides {
    pub whale_threshold_usd: Option<f64>,
    pub whale_threshold_percent: Option<f64>,
    pub alert_threshold_usd: Option<f64>,
}

impl ThresholdOverrides {
    /// Apply to a copy of the configuration and re-validate it
    pub fn apply(&self, config: &Config) -> Result<Config> {
        let mut config = config.clone();
        if let Some(usd) = self.whale_threshold_usd {
            config.analysis.whale_threshold_usd = usd;
        }
        if let Some(percent) = self.whale_threshold_percent {
            config.analysis.whale_threshold_percent = percent;
        }
        if let Some(usd) = self.alert_threshold_usd {
            config.analysis.alert_threshold_usd = usd;
        }
        config.validate().context("Invalid threshold override")?;
        Ok(config)
    }
}

/// Analyze a holder snapshot and print the report as JSON
pub fn analyze(
    config: &Config,
    snapshot_path: &Path,
    overrides: ThresholdOverrides,
    pretty: bool,
) -> Result<()> {
    let config = overrides.apply(config)?;
    let output = run_analysis(&config, snapshot_path, pretty)?;
    println!("{}", output);
    Ok(())
}

/// Run the pipeline and return the serialized report
pub fn run_analysis(config: &Config, snapshot_path: &Path, pretty: bool) -> Result<String> {
    let entities = config.entities.load_entities()?;
    info!(entities = entities.len(), "Known-entity table ready");

    let snapshot = HolderSnapshot::from_json_file(snapshot_path)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;
    if snapshot.holders.is_empty() {
        warn!("Snapshot has no holders; every metric will be 0");
    }

    let analyzer = HolderAnalyzer::new(
        config.analysis.clone(),
        entities,
        config.risk_policy.clone(),
    );
    let report = analyzer.analyze(&snapshot);

    for alert in report
        .alerts
        .iter()
        .filter(|a| a.severity == AlertSeverity::Critical)
    {
        warn!(alert = %alert.message, "Critical alert");
    }

    let output = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(crate::Error::from)?;

    Ok(output)
}

/// Show current configuration
pub fn show_config(config: &Config, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(config).map_err(crate::Error::from)?
        );
    } else {
        println!("{}", config.summary());
    }
    Ok(())
}

/// List the known-entity table in effect
pub fn list_entities(config: &Config) -> Result<()> {
    let entities = config.entities.load_entities()?;

    println!("\n=== KNOWN ENTITIES ({}) ===\n", entities.len());
    println!("{:<44} {:<20} {}", "ADDRESS", "LABEL", "TAGS");
    println!("{}", "-".repeat(90));

    for (address, entity) in entities.iter_sorted() {
        let tags: Vec<&str> = entity.tags.iter().map(String::as_str).collect();
        println!("{:<44} {:<20} {}", address, entity.label, tags.join(", "));
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "token": {
            "name": "Example",
            "symbol": "EXM",
            "address": "0xtoken",
            "chain": "ethereum",
            "total_supply": 1000.0,
            "current_price_usd": 1.0
        },
        "holders": [
            { "address": "0xaaa", "balance": 600.0 },
            { "address": "0xbbb", "balance": 300.0 },
            { "address": "0xccc", "balance": 100.0 }
        ]
    }"#;

    #[test]
    fn test_overrides_applied_and_validated() {
        let config = Config::default();
        let overrides = ThresholdOverrides {
            whale_threshold_usd: Some(1.0),
            alert_threshold_usd: Some(10.0),
            ..Default::default()
        };
        let updated = overrides.apply(&config).unwrap();
        assert_eq!(updated.analysis.whale_threshold_usd, 1.0);
        assert_eq!(updated.analysis.whale_threshold_percent, 1.0);
        assert_eq!(updated.analysis.alert_threshold_usd, 10.0);

        let bad = ThresholdOverrides {
            alert_threshold_usd: Some(-5.0),
            ..Default::default()
        };
        assert!(bad.apply(&config).is_err());
    }

    #[test]
    fn test_run_analysis_outputs_report() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let output = run_analysis(&Config::default(), file.path(), false).unwrap();
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(report["token_info"]["total_holders"], 3);
        assert_eq!(report["centralization_metrics"]["nakamoto_coefficient"], 1);
        assert_eq!(report["whale_holders"].as_array().unwrap().len(), 3);
        assert_eq!(report["metadata"]["policy_version"], "v1");
    }

    #[test]
    fn test_run_analysis_missing_snapshot() {
        let result = run_analysis(&Config::default(), Path::new("/nonexistent/snap.json"), true);
        assert!(result.is_err());
    }
}
