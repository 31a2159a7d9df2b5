//! Holder concentration analytics
//!
//! `HolderAnalyzer` runs the full pipeline over one snapshot:
//! whale classification, concentration metrics, distribution tiers,
//! alerts, the enhanced risk score and whale flow trends.

pub mod alerts;
pub mod entities;
pub mod metrics;
pub mod risk;
pub mod snapshot;
pub mod types;
pub mod whales;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::config::AnalysisConfig;

pub use alerts::{format_usd, generate_alerts, generate_alerts_at};
pub use entities::{KnownEntities, KnownEntity};
pub use metrics::centralization_metrics;
pub use risk::{RiskPolicy, RiskScorer};
pub use snapshot::HolderSnapshot;
pub use types::*;
pub use whales::{analyze_distribution, WhaleClassifier, WhaleThresholds};

/// Runs every analysis step over a snapshot
#[derive(Debug, Clone)]
pub struct HolderAnalyzer {
    classifier: WhaleClassifier,
    scorer: RiskScorer,
    alert_threshold_usd: f64,
}

impl HolderAnalyzer {
    pub fn new(config: AnalysisConfig, entities: KnownEntities, policy: RiskPolicy) -> Self {
        Self {
            classifier: WhaleClassifier::new(config.whale_thresholds(), entities),
            scorer: RiskScorer::new(policy),
            alert_threshold_usd: config.alert_threshold_usd,
        }
    }

    pub fn classifier(&self) -> &WhaleClassifier {
        &self.classifier
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn analyze(&self, snapshot: &HolderSnapshot) -> AnalysisReport {
        self.analyze_at(snapshot, Utc::now())
    }

    /// Analyze with an explicit evaluation time
    pub fn analyze_at(&self, snapshot: &HolderSnapshot, now: DateTime<Utc>) -> AnalysisReport {
        let token = &snapshot.token;
        let holders = &snapshot.holders;
        let activity = &snapshot.activity;

        info!(
            token = %token.symbol,
            holders = holders.len(),
            activity = activity.len(),
            "Analyzing holder snapshot"
        );

        let whale_holders = self.classifier.classify_at(holders, token, now);
        let centralization_metrics =
            metrics::centralization_metrics(holders, token.total_supply, whale_holders.len());
        let distribution_analysis = analyze_distribution(holders, token);
        let alerts = generate_alerts_at(
            &centralization_metrics,
            activity,
            self.alert_threshold_usd,
            now,
        );
        let enhanced_risk_score =
            self.scorer
                .score_at(&centralization_metrics, &whale_holders, activity, now);
        let holder_trends = holder_trends(activity, now);

        info!(
            token = %token.symbol,
            centralization = centralization_metrics.centralization_score,
            risk_score = enhanced_risk_score.overall_score,
            risk = %enhanced_risk_score.risk_level,
            whales = whale_holders.len(),
            alerts = alerts.len(),
            "Analysis complete"
        );

        let mut token_info = token.clone();
        token_info.total_holders = holders.len() as u64;

        AnalysisReport {
            token_info,
            centralization_metrics,
            whale_holders,
            recent_whale_activity: activity.clone(),
            distribution_analysis,
            alerts,
            holder_trends,
            enhanced_risk_score,
            metadata: ReportMetadata {
                last_updated: now,
                policy_version: self.scorer.policy().version.clone(),
                holders_analyzed: holders.len(),
                activity_records: activity.len(),
            },
        }
    }
}

/// Whale buy/sell flow over the trailing 24 hours
///
/// Fixed at 24 hours like the `*_24h` report fields; `RiskPolicy::window_hours`
/// only moves the risk scorer's window.
pub fn holder_trends(activity: &[WhaleActivity], now: DateTime<Utc>) -> HolderTrends {
    let window = Duration::hours(24);
    let mut trends = HolderTrends {
        whale_accumulation_trend: AccumulationTrend::Stable,
        net_flow_24h_usd: 0.0,
        buys_24h: 0,
        sells_24h: 0,
    };

    for record in activity.iter().filter(|a| a.is_within(now, window)) {
        match record.activity_type {
            ActivityType::Buy => {
                trends.buys_24h += 1;
                trends.net_flow_24h_usd += record.amount_usd;
            }
            ActivityType::Sell => {
                trends.sells_24h += 1;
                trends.net_flow_24h_usd -= record.amount_usd;
            }
            ActivityType::Transfer => {}
        }
    }

    trends.net_flow_24h_usd = metrics::round_to(trends.net_flow_24h_usd, 2);
    trends.whale_accumulation_trend = if trends.net_flow_24h_usd > 0.0 {
        AccumulationTrend::Accumulating
    } else if trends.net_flow_24h_usd < 0.0 {
        AccumulationTrend::Distributing
    } else {
        AccumulationTrend::Stable
    };

    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn token(total_supply: f64, price: f64) -> TokenInfo {
        TokenInfo {
            name: "Test Token".to_string(),
            symbol: "TST".to_string(),
            address: "0xtoken".to_string(),
            chain: "ethereum".to_string(),
            total_supply,
            circulating_supply: total_supply,
            current_price_usd: price,
            market_cap_usd: total_supply * price,
            total_holders: 0,
        }
    }

    fn analyzer() -> HolderAnalyzer {
        HolderAnalyzer::new(
            AnalysisConfig::default(),
            KnownEntities::builtin(),
            RiskPolicy::default(),
        )
    }

    fn flow(kind: ActivityType, hours_ago: i64, usd: f64) -> WhaleActivity {
        WhaleActivity {
            tx_hash: format!("0x{:?}{}", kind, hours_ago),
            timestamp: now() - Duration::hours(hours_ago),
            from_address: "0xfrom".to_string(),
            to_address: "0xto".to_string(),
            amount: usd,
            amount_usd: usd,
            percentage_of_supply: 0.1,
            activity_type: kind,
            from_label: None,
            to_label: None,
            exchange_detected: None,
            price_impact_estimated: None,
        }
    }

    #[test]
    fn test_equal_holders_end_to_end() {
        // Price 0 keeps the USD branch out, every holder is 10% of supply
        let holders: Vec<Holder> = (0..10).map(|i| Holder::new(format!("0x{:02}", i), 100.0)).collect();
        let snapshot = HolderSnapshot::new(token(1000.0, 0.0), holders);

        let report = analyzer().analyze_at(&snapshot, now());
        let m = &report.centralization_metrics;

        assert_eq!(m.gini_coefficient, 0.0);
        assert_eq!(m.nakamoto_coefficient, 6);
        assert_eq!(m.top10_percentage, 100.0);
        assert_eq!(report.whale_holders.len(), 10);
        assert_eq!(report.token_info.total_holders, 10);
        assert_eq!(report.distribution_analysis.whales.count, 10);
        assert_eq!(report.metadata.policy_version, "v1");
        assert_eq!(report.metadata.last_updated, now());
        assert_eq!(report.holder_trends.whale_accumulation_trend, AccumulationTrend::Stable);
        // Only the top 10 alert fires
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_dominant_holder_end_to_end() {
        let mut holders = vec![Holder::new("0xbig", 600.0)];
        holders.extend((0..9).map(|i| Holder::new(format!("0x{:02}", i), 400.0 / 9.0)));
        let snapshot = HolderSnapshot::new(token(1000.0, 1.0), holders);

        let report = analyzer().analyze_at(&snapshot, now());

        assert_eq!(report.centralization_metrics.nakamoto_coefficient, 1);
        assert_eq!(report.centralization_metrics.risk_level, RiskLevel::Critical);
        assert_eq!(report.whale_holders[0].address, "0xbig");
        assert_eq!(report.whale_holders[0].rank, 1);
        assert_eq!(report.whale_holders[0].percentage_of_supply, 60.0);
        assert!(report
            .enhanced_risk_score
            .warnings
            .iter()
            .any(|w| w == risk::WARN_MAJORITY_CONTROL));
    }

    #[test]
    fn test_exchange_whale_labeled_and_scored() {
        let (cex_address, _) = KnownEntities::builtin()
            .iter_sorted()
            .into_iter()
            .find(|(_, e)| e.tags.contains("cex"))
            .map(|(a, e)| (a.clone(), e.clone()))
            .unwrap();

        let holders = vec![
            Holder::new(cex_address.to_uppercase().replace("0X", "0x"), 450.0),
            Holder::new("0xother", 550.0),
        ];
        let snapshot = HolderSnapshot::new(token(1000.0, 0.0), holders);
        let report = analyzer().analyze_at(&snapshot, now());

        let exchange = report.whale_holders.iter().find(|w| w.is_exchange()).unwrap();
        assert!(exchange.label.is_some());
        assert_eq!(exchange.rank, 2);
        assert!(report.enhanced_risk_score.breakdown.exchange_concentration_risk.score > 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let snapshot = HolderSnapshot::new(token(1000.0, 1.0), vec![Holder::new("0xaaa", 10.0)])
            .with_activity(vec![flow(ActivityType::Sell, 1, 75_000.0)]);
        let report = analyzer().analyze_at(&snapshot, now());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["enhanced_risk_score"]["risk_level"].is_string());
        let alerts = json["alerts"].as_array().unwrap();
        assert!(alerts.iter().any(|a| a["type"] == "large_transfer"));
        assert_eq!(json["recent_whale_activity"][0]["type"], "sell");
        assert_eq!(json["metadata"]["activity_records"], 1);
    }

    #[test]
    fn test_trends_net_flow() {
        let feed = vec![
            flow(ActivityType::Buy, 1, 100_000.0),
            flow(ActivityType::Buy, 2, 50_000.0),
            flow(ActivityType::Sell, 3, 60_000.0),
            flow(ActivityType::Transfer, 4, 1_000_000.0),
            flow(ActivityType::Sell, 48, 500_000.0),
        ];
        let trends = holder_trends(&feed, now());
        assert_eq!(trends.buys_24h, 2);
        assert_eq!(trends.sells_24h, 1);
        assert_eq!(trends.net_flow_24h_usd, 90_000.0);
        assert_eq!(trends.whale_accumulation_trend, AccumulationTrend::Accumulating);

        let selling = holder_trends(&[flow(ActivityType::Sell, 1, 10.0)], now());
        assert_eq!(selling.whale_accumulation_trend, AccumulationTrend::Distributing);
    }

    #[test]
    fn test_degenerate_snapshot_does_not_fail() {
        let holders = vec![Holder::new("0xaaa", -5.0), Holder::new("0xbbb", f64::NAN)];
        let snapshot = HolderSnapshot::new(token(0.0, 1.0), holders);
        let report = analyzer().analyze_at(&snapshot, now());

        assert!(report.whale_holders.is_empty());
        assert_eq!(report.centralization_metrics.top10_percentage, 0.0);
        assert_eq!(report.centralization_metrics.herfindahl_index, 0);
        assert_eq!(report.distribution_analysis.total_percentage(), 0.0);
    }

    #[test]
    fn test_policy_window_only_moves_risk_scoring() {
        let mut policy = RiskPolicy::default();
        policy.window_hours = 48;
        let analyzer = HolderAnalyzer::new(AnalysisConfig::default(), KnownEntities::new(), policy);

        let holders: Vec<Holder> = (0..10).map(|i| Holder::new(format!("0x{:02}", i), 100.0)).collect();
        let feed = vec![
            flow(ActivityType::Sell, 30, 1_000.0),
            flow(ActivityType::Sell, 31, 1_000.0),
            flow(ActivityType::Sell, 32, 1_000.0),
        ];
        let snapshot = HolderSnapshot::new(token(1000.0, 0.0), holders).with_activity(feed);
        let report = analyzer.analyze_at(&snapshot, now());

        let whale = &report.enhanced_risk_score.breakdown.whale_behavior_risk;
        assert!(whale.factors.contains(&"3 large sells in last 48h".to_string()));

        assert_eq!(report.holder_trends.sells_24h, 0);
        assert_eq!(report.holder_trends.whale_accumulation_trend, AccumulationTrend::Stable);
        assert!(report.alerts.iter().all(|a| a.alert_type != AlertType::Distribution));
    }
}
