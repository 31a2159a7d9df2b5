//! Holder snapshot input
//!
//! A snapshot is the fully materialized output of whatever data provider the
//! caller uses. Loading performs structural checks only; numeric oddities such
//! as a zero supply are left to the analytics, which degrade instead of
//! failing.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::{Holder, TokenInfo, WhaleActivity};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    pub token: TokenInfo,
    pub holders: Vec<Holder>,
    #[serde(default)]
    pub activity: Vec<WhaleActivity>,
}

impl HolderSnapshot {
    pub fn new(token: TokenInfo, holders: Vec<Holder>) -> Self {
        Self {
            token,
            holders,
            activity: Vec::new(),
        }
    }

    pub fn with_activity(mut self, activity: Vec<WhaleActivity>) -> Self {
        self.activity = activity;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: HolderSnapshot = serde_json::from_str(json)?;
        snapshot.check()?;
        Ok(snapshot)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Snapshot(format!("failed to read {}: {}", path.display(), e)))?;
        let snapshot = Self::from_json_str(&content)?;

        info!(
            path = %path.display(),
            token = %snapshot.token.symbol,
            holders = snapshot.holders.len(),
            activity = snapshot.activity.len(),
            "Loaded holder snapshot"
        );
        Ok(snapshot)
    }

    /// Structural checks: holder addresses present and unique
    /// (case-insensitive). Suspicious numbers are only logged.
    pub fn check(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.holders.len());
        for holder in &self.holders {
            let address = holder.address.trim();
            if address.is_empty() {
                return Err(Error::Snapshot("holder with empty address".to_string()));
            }
            if !seen.insert(address.to_lowercase()) {
                return Err(Error::Snapshot(format!("duplicate holder address {}", address)));
            }
        }

        if self.token.supply().is_none() {
            warn!(
                total_supply = self.token.total_supply,
                "Token supply is not positive; supply-based metrics will be 0"
            );
        }
        let degenerate = self
            .holders
            .iter()
            .filter(|h| h.effective_balance() != h.balance)
            .count();
        if degenerate > 0 {
            warn!(degenerate, "Negative or non-finite balances will count as 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::ActivityType;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "token": {
            "name": "Example Token",
            "symbol": "EXT",
            "address": "0x1111111111111111111111111111111111111111",
            "chain": "ethereum",
            "total_supply": 1000000.0,
            "current_price_usd": 2.5
        },
        "holders": [
            { "address": "0xaaa", "balance": 600000.0 },
            { "address": "0xbbb", "balance": 400000.0, "is_contract": true,
              "first_seen": "2024-01-01T00:00:00Z" }
        ],
        "activity": [
            {
                "tx_hash": "0xdead",
                "timestamp": "2024-06-01T10:00:00Z",
                "from_address": "0xaaa",
                "to_address": "0xccc",
                "amount": 10000.0,
                "amount_usd": 25000.0,
                "percentage_of_supply": 1.0,
                "type": "transfer"
            }
        ]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = HolderSnapshot::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.token.symbol, "EXT");
        assert_eq!(snapshot.token.market_cap_usd, 0.0);
        assert_eq!(snapshot.holders.len(), 2);
        assert_eq!(snapshot.holders[1].is_contract, Some(true));
        assert!(snapshot.holders[1].first_seen.is_some());
        assert_eq!(snapshot.activity[0].activity_type, ActivityType::Transfer);
    }

    #[test]
    fn test_activity_defaults_to_empty() {
        let json = r#"{
            "token": { "name": "T", "symbol": "T", "address": "0x1", "chain": "eth", "total_supply": 10.0 },
            "holders": [ { "address": "0xaaa", "balance": 1.0 } ]
        }"#;
        let snapshot = HolderSnapshot::from_json_str(json).unwrap();
        assert!(snapshot.activity.is_empty());
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let json = r#"{
            "token": { "name": "T", "symbol": "T", "address": "0x1", "chain": "eth", "total_supply": 10.0 },
            "holders": [
                { "address": "0xAbC", "balance": 1.0 },
                { "address": "0xabc", "balance": 2.0 }
            ]
        }"#;
        let err = HolderSnapshot::from_json_str(json).unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_zero_supply_is_accepted() {
        let json = r#"{
            "token": { "name": "T", "symbol": "T", "address": "0x1", "chain": "eth", "total_supply": 0.0 },
            "holders": [ { "address": "0xaaa", "balance": -1.0 } ]
        }"#;
        assert!(HolderSnapshot::from_json_str(json).is_ok());
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let err = HolderSnapshot::from_json_str("{ \"token\": ").unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let snapshot = HolderSnapshot::from_json_file(file.path()).unwrap();
        assert_eq!(snapshot.holders[0].address, "0xaaa");

        let missing = HolderSnapshot::from_json_file("/nonexistent/snapshot.json");
        assert!(matches!(missing, Err(Error::Snapshot(_))));
    }
}
