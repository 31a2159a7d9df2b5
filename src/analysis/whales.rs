//! Whale classification and distribution bucketing
//!
//! Two separate notions of "whale" live here on purpose:
//! - [`WhaleClassifier`] picks holders above a USD value OR a share of
//!   supply, ranks them and annotates them from the entity table.
//! - [`analyze_distribution`] drops every holder into one of five tiers by
//!   share of supply, the top tier being holders with at least 5%.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::entities::KnownEntities;
use super::metrics::round_to;
use super::types::{valid_supply, DistributionAnalysis, Holder, HolderBucket, TokenInfo, WhaleHolder};

/// Whale qualification thresholds; meeting either one is enough
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhaleThresholds {
    /// Minimum position value in USD
    #[serde(default = "default_usd_threshold")]
    pub usd: f64,
    /// Minimum share of total supply, in percent
    #[serde(default = "default_percent_threshold")]
    pub percent: f64,
}

fn default_usd_threshold() -> f64 { 100_000.0 }
fn default_percent_threshold() -> f64 { 1.0 }

impl Default for WhaleThresholds {
    fn default() -> Self {
        Self {
            usd: default_usd_threshold(),
            percent: default_percent_threshold(),
        }
    }
}

/// Percentage of supply, `None` when the supply cannot be used as a denominator
fn percent_of_supply(balance: f64, total_supply: f64) -> Option<f64> {
    valid_supply(total_supply).map(|supply| balance / supply * 100.0)
}

/// Filters, ranks and labels whale holders
#[derive(Debug, Clone)]
pub struct WhaleClassifier {
    thresholds: WhaleThresholds,
    entities: KnownEntities,
}

impl WhaleClassifier {
    pub fn new(thresholds: WhaleThresholds, entities: KnownEntities) -> Self {
        Self { thresholds, entities }
    }

    pub fn thresholds(&self) -> &WhaleThresholds {
        &self.thresholds
    }

    pub fn entities(&self) -> &KnownEntities {
        &self.entities
    }

    /// Check one holder against both thresholds
    pub fn qualifies(&self, holder: &Holder, token: &TokenInfo) -> bool {
        let balance = holder.effective_balance();
        let usd_value = balance * token.price();
        let meets_percent = percent_of_supply(balance, token.total_supply)
            .map_or(false, |pct| pct >= self.thresholds.percent);

        usd_value >= self.thresholds.usd || meets_percent
    }

    /// Classify with the current time as the default for missing timestamps
    pub fn classify(&self, holders: &[Holder], token: &TokenInfo) -> Vec<WhaleHolder> {
        self.classify_at(holders, token, Utc::now())
    }

    /// Return qualifying holders, largest first, ranked from 1
    ///
    /// Holders without `first_seen`/`last_activity` get `now`.
    pub fn classify_at(
        &self,
        holders: &[Holder],
        token: &TokenInfo,
        now: DateTime<Utc>,
    ) -> Vec<WhaleHolder> {
        let mut qualifying: Vec<&Holder> = holders
            .iter()
            .filter(|h| self.qualifies(h, token))
            .collect();

        qualifying.sort_by(|a, b| {
            b.effective_balance()
                .partial_cmp(&a.effective_balance())
                .unwrap_or(Ordering::Equal)
        });

        let whales: Vec<WhaleHolder> = qualifying
            .into_iter()
            .enumerate()
            .map(|(index, holder)| self.to_whale(holder, token, index + 1, now))
            .collect();

        info!(
            holders = holders.len(),
            whales = whales.len(),
            usd_threshold = self.thresholds.usd,
            percent_threshold = self.thresholds.percent,
            "Identified whale holders"
        );

        whales
    }

    fn to_whale(
        &self,
        holder: &Holder,
        token: &TokenInfo,
        rank: usize,
        now: DateTime<Utc>,
    ) -> WhaleHolder {
        let balance = holder.effective_balance();
        let percentage = percent_of_supply(balance, token.total_supply).unwrap_or(0.0);

        let entity = self.entities.lookup(&holder.address);
        if let Some(entity) = entity {
            debug!(address = %holder.address, label = %entity.label, rank, "Labeled whale");
        }

        WhaleHolder {
            address: holder.address.clone(),
            balance,
            balance_usd: balance * token.price(),
            percentage_of_supply: round_to(percentage, 2),
            rank,
            label: entity.map(|e| e.label.clone()),
            tags: entity.map(|e| e.tags.clone()).unwrap_or_else(BTreeSet::new),
            first_seen: holder.first_seen.unwrap_or(now),
            last_activity: holder.last_activity.unwrap_or(now),
            is_contract: holder.is_contract.unwrap_or(false),
        }
    }
}

/// Tier boundaries in percent of supply, lower bound inclusive
pub mod tiers {
    pub const SMALL: f64 = 0.01;
    pub const MEDIUM: f64 = 0.1;
    pub const LARGE: f64 = 1.0;
    pub const WHALE: f64 = 5.0;
}

/// Split every holder into retail / small / medium / large / whale tiers
///
/// Percentages are relative to the token's total supply, so they add up to
/// the share covered by the snapshot, not necessarily 100. With an unusable
/// supply every holder lands in retail and all percentages are 0.
pub fn analyze_distribution(holders: &[Holder], token: &TokenInfo) -> DistributionAnalysis {
    let mut counts = [0usize; 5];
    let mut sums = [0.0f64; 5];

    for holder in holders {
        let balance = holder.effective_balance();
        let pct = percent_of_supply(balance, token.total_supply).unwrap_or(0.0);

        let tier = if pct < tiers::SMALL {
            0
        } else if pct < tiers::MEDIUM {
            1
        } else if pct < tiers::LARGE {
            2
        } else if pct < tiers::WHALE {
            3
        } else {
            4
        };

        counts[tier] += 1;
        sums[tier] += balance;
    }

    let bucket = |tier: usize| HolderBucket {
        count: counts[tier],
        total_percentage: percent_of_supply(sums[tier], token.total_supply)
            .map_or(0.0, |pct| round_to(pct, 2)),
    };

    DistributionAnalysis {
        retail_holders: bucket(0),
        small_holders: bucket(1),
        medium_holders: bucket(2),
        large_holders: bucket(3),
        whales: bucket(4),
    }
}
