//! Concentration metrics
//!
//! Closed-form inequality measures over a holder snapshot: Gini, HHI,
//! Nakamoto coefficient, top-N share, and the composite centralization
//! score that blends them.
//!
//! Every function is total. An empty snapshot or a non-positive supply
//! yields 0 instead of an error.

use std::cmp::Ordering;

use tracing::{debug, warn};

use super::types::{valid_supply, CentralizationMetrics, Holder, RiskLevel};

/// Share of supply a coalition needs for majority control
pub const MAJORITY_THRESHOLD: f64 = 0.51;

/// Round half away from zero to `decimals` places, never returning -0.0
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn balances_ascending(holders: &[Holder]) -> Vec<f64> {
    let mut balances: Vec<f64> = holders.iter().map(Holder::effective_balance).collect();
    // Stable; equal balances keep insertion order
    balances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    balances
}

fn balances_descending(holders: &[Holder]) -> Vec<f64> {
    let mut balances: Vec<f64> = holders.iter().map(Holder::effective_balance).collect();
    balances.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    balances
}

/// Gini coefficient, 0 (equal) to 1 (one holder owns everything), 3 decimals
///
/// `G = 2·Σ(i·b_i) / (n·Σb_i) − (n+1)/n` with balances ascending and `i`
/// 1-based.
pub fn gini_coefficient(holders: &[Holder]) -> f64 {
    if holders.is_empty() {
        return 0.0;
    }

    let sorted = balances_ascending(holders);
    let n = sorted.len() as f64;

    let (sum_of_products, sum_of_balances) = sorted
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(products, total), (index, balance)| {
            (products + (index as f64 + 1.0) * balance, total + balance)
        });

    if sum_of_balances == 0.0 || !sum_of_balances.is_finite() || !sum_of_products.is_finite() {
        return 0.0;
    }

    let gini = (2.0 * sum_of_products) / (n * sum_of_balances) - (n + 1.0) / n;
    round_to(gini, 3)
}

/// Herfindahl-Hirschman Index over percentage shares of `total_supply`
///
/// Below 1500 is unconcentrated, 1500-2500 moderate, above 2500 high.
pub fn herfindahl_index(holders: &[Holder], total_supply: f64) -> u64 {
    let Some(supply) = valid_supply(total_supply) else {
        return 0;
    };

    let hhi: f64 = holders
        .iter()
        .map(|h| {
            let share = h.effective_balance() / supply * 100.0;
            share * share
        })
        .sum();

    hhi.round() as u64
}

/// Smallest number of top holders whose combined balance reaches 51% of supply
///
/// If the snapshot never reaches the threshold, every holder is counted.
pub fn nakamoto_coefficient(holders: &[Holder], total_supply: f64) -> usize {
    let Some(supply) = valid_supply(total_supply) else {
        return 0;
    };
    if holders.is_empty() {
        return 0;
    }

    let threshold = supply * MAJORITY_THRESHOLD;
    let mut sum = 0.0;
    let mut count = 0;

    for balance in balances_descending(holders) {
        sum += balance;
        count += 1;
        if sum >= threshold {
            break;
        }
    }

    count
}

/// Percentage of supply held by the `n` largest holders, 2 decimals
pub fn top_n_percentage(holders: &[Holder], n: usize, total_supply: f64) -> f64 {
    let Some(supply) = valid_supply(total_supply) else {
        return 0.0;
    };
    if holders.is_empty() {
        return 0.0;
    }

    let top_sum: f64 = balances_descending(holders).into_iter().take(n).sum();
    round_to(top_sum / supply * 100.0, 2)
}

/// Raw inputs of the composite centralization score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub gini: f64,
    pub hhi: u64,
    pub nakamoto: usize,
    pub top10: f64,
    pub whale_count: usize,
    pub total_holders: usize,
}

/// Weights of the composite centralization score
pub mod weights {
    pub const TOP10: f64 = 0.30;
    pub const GINI: f64 = 0.25;
    pub const NAKAMOTO: f64 = 0.20;
    pub const WHALES: f64 = 0.15;
    pub const HHI: f64 = 0.10;
}

/// Composite 0-100 score, higher = more centralized, 2 decimals
pub fn centralization_score(inputs: &ScoreInputs) -> f64 {
    let top10_score = inputs.top10.min(100.0);
    let gini_score = inputs.gini * 100.0;

    // Coefficients of 50 or more contribute nothing
    let nakamoto_score = (100.0 - 2.0 * inputs.nakamoto as f64).max(0.0);

    let whale_percentage = if inputs.total_holders > 0 {
        inputs.whale_count as f64 / inputs.total_holders as f64 * 100.0
    } else {
        0.0
    };
    let whale_score = (whale_percentage * 10.0).min(100.0);

    let hhi_score = (inputs.hhi as f64 / 10_000.0 * 100.0).min(100.0);

    let score = top10_score * weights::TOP10
        + gini_score * weights::GINI
        + nakamoto_score * weights::NAKAMOTO
        + whale_score * weights::WHALES
        + hhi_score * weights::HHI;

    round_to(score, 2)
}

/// Compute every metric once and derive the score and tier from them
///
/// `whale_count` comes from the whale classifier run by the caller so the
/// score never depends on a second classification pass.
pub fn centralization_metrics(
    holders: &[Holder],
    total_supply: f64,
    whale_count: usize,
) -> CentralizationMetrics {
    if valid_supply(total_supply).is_none() {
        warn!(total_supply, "Non-positive total supply, supply-based metrics degrade to 0");
    }

    let gini = gini_coefficient(holders);
    let hhi = herfindahl_index(holders, total_supply);
    let nakamoto = nakamoto_coefficient(holders, total_supply);
    let top10 = top_n_percentage(holders, 10, total_supply);
    let top50 = top_n_percentage(holders, 50, total_supply);
    let top100 = top_n_percentage(holders, 100, total_supply);

    let score = centralization_score(&ScoreInputs {
        gini,
        hhi,
        nakamoto,
        top10,
        whale_count,
        total_holders: holders.len(),
    });
    let risk_level = RiskLevel::from_score(score);

    debug!(
        gini,
        hhi,
        nakamoto,
        top10,
        score,
        risk = %risk_level,
        "Computed centralization metrics"
    );

    CentralizationMetrics {
        gini_coefficient: gini,
        herfindahl_index: hhi,
        nakamoto_coefficient: nakamoto,
        top10_percentage: top10,
        top50_percentage: top50,
        top100_percentage: top100,
        centralization_score: score,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holders(balances: &[f64]) -> Vec<Holder> {
        balances
            .iter()
            .enumerate()
            .map(|(i, b)| Holder::new(format!("0x{:040x}", i + 1), *b))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gini_single_holder_is_zero() {
        assert_eq!(gini_coefficient(&holders(&[500.0])), 0.0);
    }

    #[test]
    fn test_gini_equal_balances_is_zero() {
        assert_eq!(gini_coefficient(&holders(&[25.0; 8])), 0.0);
    }

    #[test]
    fn test_gini_empty_and_zero_sum() {
        assert_eq!(gini_coefficient(&[]), 0.0);
        assert_eq!(gini_coefficient(&holders(&[0.0, 0.0, 0.0])), 0.0);
    }

    #[test]
    fn test_gini_one_owner_approaches_n_minus_one_over_n() {
        let mut balances = vec![0.0; 9];
        balances.push(1000.0);
        // (n-1)/n = 0.9
        assert_eq!(gini_coefficient(&holders(&balances)), 0.9);
    }

    #[test]
    fn test_gini_independent_of_input_order() {
        let a = gini_coefficient(&holders(&[10.0, 200.0, 35.0, 5.0]));
        let b = gini_coefficient(&holders(&[200.0, 5.0, 10.0, 35.0]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hhi_values() {
        // Two holders at 50% each: 2500 + 2500
        assert_eq!(herfindahl_index(&holders(&[500.0, 500.0]), 1000.0), 5000);
        // Monopoly
        assert_eq!(herfindahl_index(&holders(&[1000.0]), 1000.0), 10_000);
        assert_eq!(herfindahl_index(&holders(&[1000.0]), 0.0), 0);
    }

    #[test]
    fn test_nakamoto_single_majority_holder() {
        assert_eq!(nakamoto_coefficient(&holders(&[510.0, 490.0]), 1000.0), 1);
        assert_eq!(nakamoto_coefficient(&holders(&[10.0, 900.0, 90.0]), 1000.0), 1);
    }

    #[test]
    fn test_nakamoto_equal_distribution() {
        // ceil(0.51 * 100) = 51
        assert_eq!(nakamoto_coefficient(&holders(&[10.0; 100]), 1000.0), 51);
    }

    #[test]
    fn test_nakamoto_degenerate_inputs() {
        assert_eq!(nakamoto_coefficient(&[], 1000.0), 0);
        assert_eq!(nakamoto_coefficient(&holders(&[10.0]), 0.0), 0);
        assert_eq!(nakamoto_coefficient(&holders(&[10.0]), -5.0), 0);
        // Snapshot covers only 30% of supply: every holder counted
        assert_eq!(nakamoto_coefficient(&holders(&[100.0, 100.0, 100.0]), 1000.0), 3);
    }

    #[test]
    fn test_top_n_percentage() {
        let set = holders(&[50.0, 300.0, 100.0, 25.0, 25.0]);
        assert_eq!(top_n_percentage(&set, 1, 1000.0), 30.0);
        assert_eq!(top_n_percentage(&set, 2, 1000.0), 40.0);
        assert_eq!(top_n_percentage(&set, 100, 1000.0), 50.0);
        assert_eq!(top_n_percentage(&set, 3, 0.0), 0.0);
        assert_eq!(top_n_percentage(&[], 3, 1000.0), 0.0);
    }

    #[test]
    fn test_top_n_monotonic_in_n() {
        let set = holders(&[7.0, 1.0, 42.0, 3.3, 19.0, 0.5, 11.0]);
        let mut previous = 0.0;
        for n in 0..10 {
            let pct = top_n_percentage(&set, n, 200.0);
            assert!(pct >= previous, "top {} = {} < {}", n, pct, previous);
            previous = pct;
        }
    }

    #[test]
    fn test_negative_balance_degrades_to_zero() {
        let set = holders(&[-100.0, 600.0]);
        assert_eq!(top_n_percentage(&set, 10, 1000.0), 60.0);
        assert_eq!(herfindahl_index(&set, 1000.0), 3600);
    }

    #[test]
    fn test_score_nakamoto_floor() {
        let inputs = ScoreInputs {
            gini: 0.0,
            hhi: 0,
            nakamoto: 60,
            top10: 0.0,
            whale_count: 0,
            total_holders: 100,
        };
        assert_eq!(centralization_score(&inputs), 0.0);
    }

    #[test]
    fn test_score_whale_density_capped() {
        let inputs = ScoreInputs {
            gini: 0.0,
            hhi: 0,
            nakamoto: 50,
            top10: 0.0,
            whale_count: 50,
            total_holders: 100,
        };
        // 50% whales * 10 caps at 100, weighted 0.15
        assert_eq!(centralization_score(&inputs), 15.0);
    }

    #[test]
    fn test_equal_ten_holders_scenario() {
        let set = holders(&[100.0; 10]);
        let metrics = centralization_metrics(&set, 1000.0, 0);

        assert_eq!(metrics.gini_coefficient, 0.0);
        assert_eq!(metrics.nakamoto_coefficient, 6);
        assert_eq!(metrics.top10_percentage, 100.0);
        assert_eq!(metrics.herfindahl_index, 1000);

        // 100*0.30 + 0*0.25 + (100-12)*0.20 + 0*0.15 + 10*0.10
        let expected = centralization_score(&ScoreInputs {
            gini: 0.0,
            hhi: 1000,
            nakamoto: 6,
            top10: 100.0,
            whale_count: 0,
            total_holders: 10,
        });
        assert!(approx(expected, 48.6));
        assert!(approx(metrics.centralization_score, expected));
        assert_eq!(metrics.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_dominant_holder_scenario_is_critical() {
        let mut balances = vec![600.0];
        balances.extend(std::iter::repeat(400.0 / 9.0).take(9));
        let set = holders(&balances);

        // All ten hold at least 1% of supply
        let metrics = centralization_metrics(&set, 1000.0, 10);

        assert_eq!(metrics.nakamoto_coefficient, 1);
        assert_eq!(metrics.gini_coefficient, 0.5);
        assert_eq!(metrics.top10_percentage, 100.0);
        assert_eq!(metrics.herfindahl_index, 3778);
        assert!(metrics.centralization_score >= 75.0);
        assert_eq!(metrics.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_metrics_with_zero_supply() {
        let metrics = centralization_metrics(&holders(&[10.0, 20.0]), 0.0, 0);
        assert_eq!(metrics.herfindahl_index, 0);
        assert_eq!(metrics.nakamoto_coefficient, 0);
        assert_eq!(metrics.top10_percentage, 0.0);
        // Gini only depends on balances
        assert!(metrics.gini_coefficient > 0.0);
    }

    #[test]
    fn test_round_to_never_negative_zero() {
        assert!(round_to(-1e-12, 3).is_sign_positive());
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.0005, 3), 0.001);
    }

    #[test]
    fn test_gini_overflowing_balances_degrade_to_zero() {
        let gini = gini_coefficient(&holders(&[1e308, 1e308, 1e308]));
        assert_eq!(gini, 0.0);
        assert!(!gini.is_nan());
    }
}
