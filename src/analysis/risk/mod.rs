//! Enhanced risk scoring
//!
//! Combines four independently scored factors into one 0-100 score:
//! centralization, whale behavior, exchange concentration and transfer
//! pattern. Points are additive inside a factor, then clamped to [0, 100].
//! The overall score is the weighted sum using the policy's weights.

pub mod policy;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::metrics::round_to;
use super::types::{
    ActivityType, CentralizationMetrics, EnhancedRiskScore, RiskBreakdown, RiskFactor, RiskLevel,
    WhaleActivity, WhaleHolder,
};

pub use policy::{Band, BandTable, Comparison, FactorWeights, RiskPolicy};

pub const NO_RECENT_ACTIVITY: &str = "No recent whale activity";
pub const NO_EXCHANGE_HOLDINGS: &str = "No major exchange holdings detected";

pub const WARN_CENTRALIZED: &str = "⚠️ CRITICAL: Extremely centralized token distribution";
pub const WARN_MAJORITY_CONTROL: &str = "⚠️ CRITICAL: Very few holders can control majority of supply";
pub const WARN_EXCHANGE_PRESSURE: &str = "⚠️ HIGH: Significant sell pressure risk from exchange holdings";
pub const WARN_WHALE_BEHAVIOR: &str = "⚠️ HIGH: Concerning whale behavior patterns detected";

pub const REC_WAIT: &str = "Consider waiting for better distribution before investing";
pub const REC_MONITOR_EXCHANGES: &str = "Monitor exchange deposit/withdrawal activity closely";
pub const REC_DIVERSIFY: &str = "High centralization risk - diversify holdings";
pub const REC_DISTRIBUTION_CAUTION: &str = "Recent distribution pattern suggests caution";

/// Score of one factor before weighting
#[derive(Debug, Clone, Default, PartialEq)]
struct FactorScore {
    score: f64,
    factors: Vec<String>,
}

impl FactorScore {
    fn add(&mut self, points: f64, factor: String) {
        self.score += points;
        self.factors.push(factor);
    }

    fn clamped(mut self) -> Self {
        self.score = self.score.clamp(0.0, 100.0);
        self
    }

    fn into_risk_factor(self, weight: f64) -> RiskFactor {
        RiskFactor {
            score: round_to(self.score, 1),
            weight,
            factors: self.factors,
        }
    }
}

/// Applies a [`RiskPolicy`] to metrics, whales and the activity feed
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    policy: RiskPolicy,
}

impl RiskScorer {
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Score with the current time as evaluation time
    pub fn score(
        &self,
        metrics: &CentralizationMetrics,
        whales: &[WhaleHolder],
        activity: &[WhaleActivity],
    ) -> EnhancedRiskScore {
        self.score_at(metrics, whales, activity, Utc::now())
    }

    /// Score with an explicit evaluation time for the trailing window
    pub fn score_at(
        &self,
        metrics: &CentralizationMetrics,
        whales: &[WhaleHolder],
        activity: &[WhaleActivity],
        now: DateTime<Utc>,
    ) -> EnhancedRiskScore {
        let weights = self.policy.weights;

        let centralization = self.centralization_risk(metrics).clamped();
        let whale_behavior = self.whale_behavior_risk(whales, activity, now).clamped();
        let exchange = self.exchange_risk(whales).clamped();
        let transfer = self.transfer_pattern_risk(activity, now).clamped();

        debug!(
            centralization = centralization.score,
            whale_behavior = whale_behavior.score,
            exchange = exchange.score,
            transfer = transfer.score,
            "Risk factor scores"
        );

        let overall = centralization.score * weights.centralization
            + whale_behavior.score * weights.whale_behavior
            + exchange.score * weights.exchange
            + transfer.score * weights.transfer;

        // Tier comes from the unrounded score
        let risk_level = RiskLevel::from_score(overall);

        let warnings = self.warnings(metrics, &centralization, &exchange, &whale_behavior);
        let recommendations = self.recommendations(metrics, overall, &exchange, &transfer);

        info!(
            overall = round_to(overall, 1),
            risk = %risk_level,
            policy = %self.policy.version,
            warnings = warnings.len(),
            "Enhanced risk score"
        );

        EnhancedRiskScore {
            overall_score: round_to(overall, 1),
            risk_level,
            breakdown: RiskBreakdown {
                centralization_risk: centralization.into_risk_factor(weights.centralization),
                whale_behavior_risk: whale_behavior.into_risk_factor(weights.whale_behavior),
                exchange_concentration_risk: exchange.into_risk_factor(weights.exchange),
                transfer_pattern_risk: transfer.into_risk_factor(weights.transfer),
            },
            warnings,
            recommendations,
        }
    }

    fn centralization_risk(&self, metrics: &CentralizationMetrics) -> FactorScore {
        let bands = &self.policy.centralization;
        let mut result = FactorScore::default();

        if let Some(band) = bands.gini.select(metrics.gini_coefficient) {
            result.add(
                band.points,
                format!("{} Gini coefficient ({:.3})", band.label, metrics.gini_coefficient),
            );
        }

        if let Some(band) = bands.nakamoto.select(metrics.nakamoto_coefficient as f64) {
            result.add(
                band.points,
                format!("{} Nakamoto coefficient ({})", band.label, metrics.nakamoto_coefficient),
            );
        }

        if let Some(band) = bands.top10.select(metrics.top10_percentage) {
            result.add(
                band.points,
                format!("Top 10 control {:.1}% of supply", metrics.top10_percentage),
            );
        }

        if let Some(band) = bands.hhi.select(metrics.herfindahl_index as f64) {
            result.add(
                band.points,
                format!("{} market concentration (HHI: {})", band.label, metrics.herfindahl_index),
            );
        }

        result
    }

    fn whale_behavior_risk(
        &self,
        whales: &[WhaleHolder],
        activity: &[WhaleActivity],
        now: DateTime<Utc>,
    ) -> FactorScore {
        let bands = &self.policy.whale_behavior;
        let window = self.policy.window();
        let mut result = FactorScore::default();

        let large_holders = whales
            .iter()
            .filter(|w| w.percentage_of_supply > bands.large_holder_percent)
            .count();
        if let Some(band) = bands.large_holders.select(large_holders as f64) {
            result.add(
                band.points,
                format!("{} whales hold >{}% each", large_holders, bands.large_holder_percent),
            );
        }

        if activity.is_empty() {
            result.factors.push(NO_RECENT_ACTIVITY.to_string());
        }

        let recent_sells = activity
            .iter()
            .filter(|a| a.activity_type == ActivityType::Sell && a.is_within(now, window))
            .count();
        if let Some(band) = bands.recent_sells.select(recent_sells as f64) {
            result.add(
                band.points,
                format!("{} {} in last {}h", recent_sells, band.label, self.policy.window_hours),
            );
        }

        let largest_transfer = activity
            .iter()
            .map(|a| a.percentage_of_supply)
            .filter(|pct| *pct > bands.large_transfer_percent)
            .fold(None, |max: Option<f64>, pct| Some(max.map_or(pct, |m| m.max(pct))));
        if let Some(pct) = largest_transfer {
            if let Some(band) = bands.largest_transfer.select(pct) {
                result.add(band.points, format!("Transfer of {:.2}% of supply detected", pct));
            }
        }

        let exchange_pct: f64 = whales
            .iter()
            .filter(|w| w.is_exchange())
            .map(|w| w.percentage_of_supply)
            .sum();
        if let Some(band) = bands.exchange_holdings.select(exchange_pct) {
            result.add(band.points, format!("Exchanges hold {:.1}% of supply", exchange_pct));
        }

        result
    }

    fn exchange_risk(&self, whales: &[WhaleHolder]) -> FactorScore {
        let bands = &self.policy.exchange;
        let mut result = FactorScore::default();

        let exchanges: Vec<&WhaleHolder> = whales.iter().filter(|w| w.is_exchange()).collect();
        if exchanges.is_empty() {
            result.factors.push(NO_EXCHANGE_HOLDINGS.to_string());
            return result;
        }

        let total: f64 = exchanges.iter().map(|w| w.percentage_of_supply).sum();
        if let Some(band) = bands.total.select(total) {
            result.add(
                band.points,
                format!("{:.1}% held on exchanges - {} sell pressure risk", total, band.label),
            );
        }

        // First holder wins ties
        let largest = exchanges.iter().copied().skip(1).fold(exchanges[0], |max, w| {
            if w.percentage_of_supply > max.percentage_of_supply {
                w
            } else {
                max
            }
        });
        if let Some(band) = bands.largest.select(largest.percentage_of_supply) {
            let name = largest.label.as_deref().unwrap_or(&largest.address);
            result.add(
                band.points,
                format!(
                    "{} ({}) holds {:.1}%",
                    band.label, name, largest.percentage_of_supply
                ),
            );
        }

        result
    }

    fn transfer_pattern_risk(&self, activity: &[WhaleActivity], now: DateTime<Utc>) -> FactorScore {
        let bands = &self.policy.transfer;
        let hours = self.policy.window_hours;
        let mut result = FactorScore::default();

        if activity.is_empty() {
            result.factors.push(NO_RECENT_ACTIVITY.to_string());
            return result;
        }

        let window = self.policy.window();
        let recent: Vec<&WhaleActivity> = activity.iter().filter(|a| a.is_within(now, window)).collect();

        let buys = recent.iter().filter(|a| a.activity_type == ActivityType::Buy).count();
        let sells = recent.iter().filter(|a| a.activity_type == ActivityType::Sell).count();

        if sells as f64 > buys as f64 * bands.ratio {
            result.add(
                bands.distribution_points,
                format!("Distribution pattern: {} sells vs {} buys in {}h", sells, buys, hours),
            );
        } else if sells > buys {
            result.add(
                bands.mild_distribution_points,
                format!("Mild distribution: {} sells vs {} buys in {}h", sells, buys, hours),
            );
        } else if buys as f64 > sells as f64 * bands.ratio {
            result.add(
                -bands.accumulation_credit,
                format!("Accumulation pattern: {} buys vs {} sells in {}h", buys, sells, hours),
            );
        }

        let deposits = recent
            .iter()
            .filter(|a| {
                a.activity_type == ActivityType::Sell
                    && a.exchange_detected.as_deref().map_or(false, |e| !e.is_empty())
            })
            .count();
        if let Some(band) = bands.exchange_deposits.select(deposits as f64) {
            result.add(band.points, format!("{} {} in {}h", deposits, band.label, hours));
        }

        if let Some(band) = bands.velocity.select(recent.len() as f64) {
            result.add(
                band.points,
                format!(
                    "{} transfer velocity: {} large transfers in {}h",
                    band.label,
                    recent.len(),
                    hours
                ),
            );
        }

        result
    }

    /// Independent gates, emitted in a fixed order
    fn warnings(
        &self,
        metrics: &CentralizationMetrics,
        centralization: &FactorScore,
        exchange: &FactorScore,
        whale_behavior: &FactorScore,
    ) -> Vec<String> {
        let gates = &self.policy.warnings;
        let mut warnings = Vec::new();

        if centralization.score > gates.centralization_above {
            warnings.push(WARN_CENTRALIZED.to_string());
        }
        if metrics.nakamoto_coefficient < gates.nakamoto_below {
            warnings.push(WARN_MAJORITY_CONTROL.to_string());
        }
        if exchange.score > gates.exchange_above {
            warnings.push(WARN_EXCHANGE_PRESSURE.to_string());
        }
        if whale_behavior.score > gates.whale_behavior_above {
            warnings.push(WARN_WHALE_BEHAVIOR.to_string());
        }

        warnings
    }

    fn recommendations(
        &self,
        metrics: &CentralizationMetrics,
        overall: f64,
        exchange: &FactorScore,
        transfer: &FactorScore,
    ) -> Vec<String> {
        let gates = &self.policy.recommendations;
        let mut recommendations = Vec::new();

        if overall > gates.overall_above {
            recommendations.push(REC_WAIT.to_string());
        }
        if exchange.score > gates.exchange_above {
            recommendations.push(REC_MONITOR_EXCHANGES.to_string());
        }
        if metrics.nakamoto_coefficient < gates.nakamoto_below {
            recommendations.push(REC_DIVERSIFY.to_string());
        }
        if transfer.score > gates.transfer_pattern_above {
            recommendations.push(REC_DISTRIBUTION_CAUTION.to_string());
        }

        recommendations
    }
}
