//! Shared data structures for holder analysis
//!
//! Inputs (`Holder`, `TokenInfo`, `WhaleActivity`) come from external data
//! providers already resolved. Everything else is produced fresh on every
//! analysis run and never mutated afterwards.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a holder snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    pub balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_contract: Option<bool>,
}

impl Holder {
    pub fn new(address: impl Into<String>, balance: f64) -> Self {
        Self {
            address: address.into(),
            balance,
            first_seen: None,
            last_activity: None,
            is_contract: None,
        }
    }

    /// Balance usable in arithmetic: negative and non-finite values count as 0
    pub fn effective_balance(&self) -> f64 {
        if self.balance.is_finite() && self.balance > 0.0 {
            self.balance
        } else {
            0.0
        }
    }
}

/// Token metadata and market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub address: String,
    pub chain: String,
    pub total_supply: f64,
    #[serde(default)]
    pub circulating_supply: f64,
    #[serde(default)]
    pub current_price_usd: f64,
    #[serde(default)]
    pub market_cap_usd: f64,
    #[serde(default)]
    pub total_holders: u64,
}

impl TokenInfo {
    /// Supply usable as a denominator, `None` when zero, negative or non-finite
    pub fn supply(&self) -> Option<f64> {
        valid_supply(self.total_supply)
    }

    /// Price usable in arithmetic: negative and non-finite values count as 0
    pub fn price(&self) -> f64 {
        if self.current_price_usd.is_finite() && self.current_price_usd > 0.0 {
            self.current_price_usd
        } else {
            0.0
        }
    }
}

pub(crate) fn valid_supply(total_supply: f64) -> Option<f64> {
    (total_supply.is_finite() && total_supply > 0.0).then_some(total_supply)
}

/// Risk tier shared by the centralization score and the enhanced risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map a 0-100 score to a tier; each lower bound is inclusive
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskLevel::Critical
        } else if score >= 50.0 {
            RiskLevel::High
        } else if score >= 25.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concentration metrics for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralizationMetrics {
    pub gini_coefficient: f64,
    pub herfindahl_index: u64,
    pub nakamoto_coefficient: usize,
    pub top10_percentage: f64,
    pub top50_percentage: f64,
    pub top100_percentage: f64,
    pub centralization_score: f64,
    pub risk_level: RiskLevel,
}

/// A holder that passed the whale thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleHolder {
    pub address: String,
    pub balance: f64,
    pub balance_usd: f64,
    pub percentage_of_supply: f64,
    /// 1-based, by descending balance
    pub rank: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub tags: BTreeSet<String>,
    pub first_seen: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_contract: bool,
}

impl WhaleHolder {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Centralized exchange custody (`exchange` or `cex` tag)
    pub fn is_exchange(&self) -> bool {
        self.has_tag("exchange") || self.has_tag("cex")
    }
}

/// Direction of a whale transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Buy,
    Sell,
    Transfer,
}

impl ActivityType {
    /// Noun used in alert messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityType::Buy => "Purchase",
            ActivityType::Sell => "Sale",
            ActivityType::Transfer => "Transfer",
        }
    }
}

/// A large transfer reported by the activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleActivity {
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    pub amount_usd: f64,
    pub percentage_of_supply: f64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_detected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_impact_estimated: Option<f64>,
}

impl WhaleActivity {
    /// Whether this record happened less than `window` before `now`
    pub fn is_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now - self.timestamp < window
    }
}

/// Count and share of supply for one distribution tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderBucket {
    pub count: usize,
    pub total_percentage: f64,
}

/// Holders split into five tiers by percentage of supply
///
/// `whales` here means any holder with at least 5% of supply. It is a
/// different question from the threshold-based `WhaleHolder` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionAnalysis {
    pub retail_holders: HolderBucket,
    pub small_holders: HolderBucket,
    pub medium_holders: HolderBucket,
    pub large_holders: HolderBucket,
    pub whales: HolderBucket,
}

impl DistributionAnalysis {
    pub fn total_count(&self) -> usize {
        self.buckets().iter().map(|b| b.count).sum()
    }

    pub fn total_percentage(&self) -> f64 {
        self.buckets().iter().map(|b| b.total_percentage).sum()
    }

    fn buckets(&self) -> [HolderBucket; 5] {
        [
            self.retail_holders,
            self.small_holders,
            self.medium_holders,
            self.large_holders,
            self.whales,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl AlertSeverity {
    /// Sort key: most severe first
    pub fn rank(&self) -> u8 {
        match self {
            AlertSeverity::Critical => 0,
            AlertSeverity::Warning => 1,
            AlertSeverity::Info => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LargeTransfer,
    Accumulation,
    Distribution,
    CentralizationRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Score of one risk factor with the reasons behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub score: f64,
    pub weight: f64,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub centralization_risk: RiskFactor,
    pub whale_behavior_risk: RiskFactor,
    pub exchange_concentration_risk: RiskFactor,
    pub transfer_pattern_risk: RiskFactor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedRiskScore {
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub breakdown: RiskBreakdown,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationTrend {
    Accumulating,
    Distributing,
    Stable,
}

/// Whale flow over the trailing 24 hours of the activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderTrends {
    pub whale_accumulation_trend: AccumulationTrend,
    pub net_flow_24h_usd: f64,
    pub buys_24h: usize,
    pub sells_24h: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub last_updated: DateTime<Utc>,
    pub policy_version: String,
    pub holders_analyzed: usize,
    pub activity_records: usize,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub token_info: TokenInfo,
    pub centralization_metrics: CentralizationMetrics,
    pub whale_holders: Vec<WhaleHolder>,
    pub recent_whale_activity: Vec<WhaleActivity>,
    pub distribution_analysis: DistributionAnalysis,
    pub alerts: Vec<Alert>,
    pub holder_trends: HolderTrends,
    pub enhanced_risk_score: EnhancedRiskScore,
    pub metadata: ReportMetadata,
}
