//! Versioned risk policy
//!
//! Every weight, band and gate the risk scorer uses lives here as data, so a
//! different policy can be loaded from configuration without touching the
//! scoring code. `RiskPolicy::default()` is policy `v1`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a band's bound is compared against the measured value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// value > bound
    Above,
    /// value >= bound
    AtLeast,
    /// value < bound
    Below,
}

impl Comparison {
    pub fn matches(self, value: f64, bound: f64) -> bool {
        match self {
            Comparison::Above => value > bound,
            Comparison::AtLeast => value >= bound,
            Comparison::Below => value < bound,
        }
    }
}

/// One scoring band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub bound: f64,
    pub points: f64,
    /// Wording used in the explanatory factor string
    #[serde(default)]
    pub label: String,
}

/// Bands ordered most severe first; the first match wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    pub comparison: Comparison,
    pub bands: Vec<Band>,
}

impl BandTable {
    pub fn new(comparison: Comparison, bands: &[(f64, f64, &str)]) -> Self {
        Self {
            comparison,
            bands: bands
                .iter()
                .map(|(bound, points, label)| Band {
                    bound: *bound,
                    points: *points,
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    /// Highest-severity band the value falls into
    pub fn select(&self, value: f64) -> Option<&Band> {
        self.bands
            .iter()
            .find(|band| self.comparison.matches(value, band.bound))
    }

    fn validate(&self, name: &str) -> std::result::Result<(), String> {
        for band in &self.bands {
            if band.bound.is_nan() || !band.points.is_finite() {
                return Err(format!("{}: band bounds and points must be numbers", name));
            }
        }
        let ordered = self.bands.windows(2).all(|pair| match self.comparison {
            Comparison::Above | Comparison::AtLeast => pair[0].bound > pair[1].bound,
            Comparison::Below => pair[0].bound < pair[1].bound,
        });
        if !ordered {
            return Err(format!("{}: bands must be ordered most severe first", name));
        }
        Ok(())
    }
}

/// Weights of the four risk factors in the overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub centralization: f64,
    pub whale_behavior: f64,
    pub exchange: f64,
    pub transfer: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            centralization: 0.40,
            whale_behavior: 0.30,
            exchange: 0.20,
            transfer: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.centralization + self.whale_behavior + self.exchange + self.transfer
    }

    fn as_array(&self) -> [f64; 4] {
        [self.centralization, self.whale_behavior, self.exchange, self.transfer]
    }
}

/// Centralization factor: Gini (30), Nakamoto (25), top 10 (25), HHI (20)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralizationBands {
    pub gini: BandTable,
    pub nakamoto: BandTable,
    pub top10: BandTable,
    pub hhi: BandTable,
}

impl Default for CentralizationBands {
    fn default() -> Self {
        Self {
            gini: BandTable::new(
                Comparison::Above,
                &[(0.8, 30.0, "Extremely high"), (0.6, 20.0, "High"), (0.4, 10.0, "Moderate")],
            ),
            nakamoto: BandTable::new(
                Comparison::Below,
                &[(3.0, 25.0, "Very low"), (5.0, 20.0, "Low"), (10.0, 10.0, "Moderate")],
            ),
            top10: BandTable::new(
                Comparison::Above,
                &[(80.0, 25.0, ""), (60.0, 20.0, ""), (40.0, 10.0, "")],
            ),
            hhi: BandTable::new(
                Comparison::Above,
                &[(2500.0, 20.0, "High"), (1500.0, 10.0, "Moderate")],
            ),
        }
    }
}

/// Whale behavior factor: large holders (20), recent sells (30),
/// largest transfer (25), exchange holdings (25)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhaleBehaviorBands {
    /// A whale above this share of supply counts as a large holder
    pub large_holder_percent: f64,
    pub large_holders: BandTable,
    pub recent_sells: BandTable,
    /// Only transfers above this share of supply are considered
    pub large_transfer_percent: f64,
    pub largest_transfer: BandTable,
    pub exchange_holdings: BandTable,
}

impl Default for WhaleBehaviorBands {
    fn default() -> Self {
        Self {
            large_holder_percent: 5.0,
            large_holders: BandTable::new(Comparison::Above, &[(5.0, 20.0, ""), (3.0, 10.0, "")]),
            recent_sells: BandTable::new(
                Comparison::AtLeast,
                &[
                    (5.0, 30.0, "large sells"),
                    (3.0, 20.0, "large sells"),
                    (1.0, 10.0, "large sell(s)"),
                ],
            ),
            large_transfer_percent: 1.0,
            largest_transfer: BandTable::new(Comparison::Above, &[(5.0, 25.0, ""), (2.0, 15.0, "")]),
            exchange_holdings: BandTable::new(Comparison::Above, &[(50.0, 25.0, ""), (30.0, 15.0, "")]),
        }
    }
}

/// Exchange concentration factor: total exchange share (50) and largest
/// single exchange (50)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeBands {
    pub total: BandTable,
    pub largest: BandTable,
}

impl Default for ExchangeBands {
    fn default() -> Self {
        Self {
            total: BandTable::new(
                Comparison::Above,
                &[
                    (60.0, 50.0, "extreme"),
                    (40.0, 35.0, "high"),
                    (20.0, 20.0, "moderate"),
                    (f64::MIN, 5.0, "low"),
                ],
            ),
            largest: BandTable::new(
                Comparison::Above,
                &[
                    (30.0, 50.0, "Single exchange"),
                    (20.0, 30.0, "Largest exchange"),
                    (10.0, 15.0, "Largest exchange"),
                ],
            ),
        }
    }
}

/// Transfer pattern factor over the trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferBands {
    /// Sells above `ratio` x buys is a distribution pattern, and vice versa
    pub ratio: f64,
    pub distribution_points: f64,
    /// Sells outnumber buys but below `ratio`
    pub mild_distribution_points: f64,
    /// Subtracted when buys outnumber sells by more than `ratio`
    pub accumulation_credit: f64,
    pub exchange_deposits: BandTable,
    pub velocity: BandTable,
}

impl Default for TransferBands {
    fn default() -> Self {
        Self {
            ratio: 2.0,
            distribution_points: 30.0,
            mild_distribution_points: 15.0,
            accumulation_credit: 10.0,
            exchange_deposits: BandTable::new(
                Comparison::Above,
                &[(5.0, 25.0, "large exchange deposits"), (2.0, 15.0, "exchange deposits")],
            ),
            velocity: BandTable::new(
                Comparison::Above,
                &[(20.0, 20.0, "High"), (10.0, 10.0, "Moderate")],
            ),
        }
    }
}

/// Thresholds that gate the fixed warning strings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningGates {
    pub centralization_above: f64,
    pub nakamoto_below: usize,
    pub exchange_above: f64,
    pub whale_behavior_above: f64,
}

impl Default for WarningGates {
    fn default() -> Self {
        Self {
            centralization_above: 75.0,
            nakamoto_below: 3,
            exchange_above: 60.0,
            whale_behavior_above: 70.0,
        }
    }
}

/// Thresholds that gate the fixed recommendation strings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationGates {
    pub overall_above: f64,
    pub exchange_above: f64,
    pub nakamoto_below: usize,
    pub transfer_pattern_above: f64,
}

impl Default for RecommendationGates {
    fn default() -> Self {
        Self {
            overall_above: 50.0,
            exchange_above: 40.0,
            nakamoto_below: 5,
            transfer_pattern_above: 30.0,
        }
    }
}

const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Complete scoring policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub version: String,
    /// Trailing window for activity-based signals
    pub window_hours: i64,
    pub weights: FactorWeights,
    pub centralization: CentralizationBands,
    pub whale_behavior: WhaleBehaviorBands,
    pub exchange: ExchangeBands,
    pub transfer: TransferBands,
    pub warnings: WarningGates,
    pub recommendations: RecommendationGates,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            window_hours: DEFAULT_WINDOW_HOURS,
            weights: FactorWeights::default(),
            centralization: CentralizationBands::default(),
            whale_behavior: WhaleBehaviorBands::default(),
            exchange: ExchangeBands::default(),
            transfer: TransferBands::default(),
            warnings: WarningGates::default(),
            recommendations: RecommendationGates::default(),
        }
    }
}

impl RiskPolicy {
    /// Trailing window; an unrepresentable `window_hours` falls back to the
    /// `v1` 24 hours
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.window_hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_WINDOW_HOURS))
    }

    /// Reject policies whose weights do not sum to 1 or whose bands are
    /// out of order
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidPolicy {
            version: self.version.clone(),
            reason,
        };

        if self.version.trim().is_empty() {
            return Err(invalid("version must not be empty".to_string()));
        }
        if self.window_hours <= 0 || chrono::Duration::try_hours(self.window_hours).is_none() {
            return Err(invalid(format!(
                "window_hours must be a positive, representable number of hours, got {}",
                self.window_hours
            )));
        }

        let weights = self.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0 || *w > 1.0) {
            return Err(invalid("every weight must be within [0, 1]".to_string()));
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(invalid(format!("weights sum to {}, expected 1.0", sum)));
        }

        if self.transfer.ratio <= 0.0 {
            return Err(invalid("transfer.ratio must be positive".to_string()));
        }

        let tables = [
            ("centralization.gini", &self.centralization.gini),
            ("centralization.nakamoto", &self.centralization.nakamoto),
            ("centralization.top10", &self.centralization.top10),
            ("centralization.hhi", &self.centralization.hhi),
            ("whale_behavior.large_holders", &self.whale_behavior.large_holders),
            ("whale_behavior.recent_sells", &self.whale_behavior.recent_sells),
            ("whale_behavior.largest_transfer", &self.whale_behavior.largest_transfer),
            ("whale_behavior.exchange_holdings", &self.whale_behavior.exchange_holdings),
            ("exchange.total", &self.exchange.total),
            ("exchange.largest", &self.exchange.largest),
            ("transfer.exchange_deposits", &self.transfer.exchange_deposits),
            ("transfer.velocity", &self.transfer.velocity),
        ];
        for (name, table) in tables {
            table.validate(name).map_err(invalid)?;
        }

        Ok(())
    }
}
