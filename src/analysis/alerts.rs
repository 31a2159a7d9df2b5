//! Rule-based alert generation
//!
//! Alerts are built fresh on every call from the centralization metrics and
//! the activity feed. Nothing is deduplicated against earlier runs.

use std::cmp::Reverse;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::types::{
    ActivityType, Alert, AlertSeverity, AlertType, CentralizationMetrics, WhaleActivity,
};

/// Aggregate pattern alerts need at least this many transfers in the window
pub const PATTERN_MIN_COUNT: usize = 3;

/// Large transfers above this multiple of the threshold are critical
pub const CRITICAL_MULTIPLIER: f64 = 5.0;

/// Pattern alerts always look back 24 hours, whatever window the risk
/// policy scores with; their messages name the 24h period.
fn pattern_window() -> Duration {
    Duration::hours(24)
}

/// Generate alerts with the current time as evaluation time
pub fn generate_alerts(
    metrics: &CentralizationMetrics,
    activity: &[WhaleActivity],
    alert_threshold_usd: f64,
) -> Vec<Alert> {
    generate_alerts_at(metrics, activity, alert_threshold_usd, Utc::now())
}

/// Generate alerts ordered most severe first, then most recent first
pub fn generate_alerts_at(
    metrics: &CentralizationMetrics,
    activity: &[WhaleActivity],
    alert_threshold_usd: f64,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = centralization_alerts(metrics, now);
    alerts.extend(large_transfer_alerts(activity, alert_threshold_usd));
    alerts.extend(pattern_alerts(activity, now));

    // Vec::sort_by_key is stable
    alerts.sort_by_key(|a| (a.severity.rank(), Reverse(a.timestamp)));

    info!(
        alerts = alerts.len(),
        critical = alerts.iter().filter(|a| a.severity == AlertSeverity::Critical).count(),
        "Alerts generated"
    );
    alerts
}

/// Human-scaled USD amount: `$1.50M`, `$75.00K`, `$12.30`
pub fn format_usd(amount: f64) -> String {
    if amount >= 1_000_000.0 {
        format!("${:.2}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("${:.2}K", amount / 1_000.0)
    } else {
        format!("${:.2}", amount)
    }
}

fn alert(severity: AlertSeverity, alert_type: AlertType, message: String, timestamp: DateTime<Utc>) -> Alert {
    Alert {
        severity,
        alert_type,
        message,
        timestamp,
        related_address: None,
        data: None,
    }
}

/// One alert per metric at most; the more severe band is checked first
fn centralization_alerts(metrics: &CentralizationMetrics, now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut push = |severity, message| {
        alerts.push(alert(severity, AlertType::CentralizationRisk, message, now));
    };

    let top10 = metrics.top10_percentage;
    if top10 > 70.0 {
        push(
            AlertSeverity::Critical,
            format!("High centralization: Top 10 holders control {:.1}% of supply", top10),
        );
    } else if top10 > 50.0 {
        push(
            AlertSeverity::Warning,
            format!("Moderate centralization: Top 10 holders control {:.1}% of supply", top10),
        );
    }

    let nakamoto = metrics.nakamoto_coefficient;
    if nakamoto < 3 {
        push(
            AlertSeverity::Critical,
            format!("Extreme centralization: Only {} holder(s) needed for 51% control", nakamoto),
        );
    } else if nakamoto < 5 {
        push(
            AlertSeverity::Warning,
            format!("High centralization risk: {} holders needed for 51% control", nakamoto),
        );
    }

    let gini = metrics.gini_coefficient;
    if gini > 0.8 {
        push(
            AlertSeverity::Critical,
            format!("Very high inequality: Gini coefficient of {:.3}", gini),
        );
    } else if gini > 0.6 {
        push(
            AlertSeverity::Warning,
            format!("High inequality: Gini coefficient of {:.3}", gini),
        );
    }

    alerts
}

fn large_transfer_alerts(activity: &[WhaleActivity], threshold_usd: f64) -> Vec<Alert> {
    activity
        .iter()
        .filter(|tx| tx.amount_usd >= threshold_usd)
        .map(|tx| {
            let severity = if tx.amount_usd > threshold_usd * CRITICAL_MULTIPLIER {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };

            let mut message = format!(
                "Large {}: {} ({:.2}% of supply)",
                tx.activity_type.display_name(),
                format_usd(tx.amount_usd),
                tx.percentage_of_supply
            );
            if let Some(exchange) = tx.exchange_detected.as_deref().filter(|e| !e.is_empty()) {
                let direction = if tx.activity_type == ActivityType::Sell { "to" } else { "from" };
                message.push_str(&format!(" {} {}", direction, exchange));
            }

            debug!(tx = %tx.tx_hash, usd = tx.amount_usd, ?severity, "Large transfer alert");

            Alert {
                severity,
                alert_type: AlertType::LargeTransfer,
                message,
                timestamp: tx.timestamp,
                related_address: Some(tx.from_address.clone()),
                data: serde_json::to_value(tx).ok(),
            }
        })
        .collect()
}

fn pattern_alerts(activity: &[WhaleActivity], now: DateTime<Utc>) -> Vec<Alert> {
    let window = pattern_window();
    let in_window = |kind: ActivityType| -> (usize, f64) {
        activity
            .iter()
            .filter(|a| a.activity_type == kind && a.is_within(now, window))
            .fold((0, 0.0), |(count, usd), a| (count + 1, usd + a.amount_usd))
    };

    let mut alerts = Vec::new();

    let (buys, buy_usd) = in_window(ActivityType::Buy);
    if buys >= PATTERN_MIN_COUNT {
        alerts.push(alert(
            AlertSeverity::Info,
            AlertType::Accumulation,
            format!(
                "Accumulation detected: {} large purchases totaling {} in 24h",
                buys,
                format_usd(buy_usd)
            ),
            now,
        ));
    }

    let (sells, sell_usd) = in_window(ActivityType::Sell);
    if sells >= PATTERN_MIN_COUNT {
        alerts.push(alert(
            AlertSeverity::Warning,
            AlertType::Distribution,
            format!(
                "Distribution detected: {} large sales totaling {} in 24h",
                sells,
                format_usd(sell_usd)
            ),
            now,
        ));
    }

    alerts
}
