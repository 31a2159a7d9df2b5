//! Known-entity lookup
//!
//! Immutable address book used to annotate whale records with a label and
//! tags. It is passed explicitly to the classifier; there is no global table.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Label and tags attached to a known address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEntity {
    pub label: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl KnownEntity {
    pub fn new(label: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            label: label.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Address book keyed by lower-cased address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownEntities {
    entries: HashMap<String, KnownEntity>,
}

impl KnownEntities {
    /// Empty table; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, address is normalized to lower case
    pub fn with_entity(mut self, address: &str, entity: KnownEntity) -> Self {
        self.insert(address, entity);
        self
    }

    pub fn insert(&mut self, address: &str, entity: KnownEntity) {
        self.entries.insert(address.to_lowercase(), entity);
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, address: &str) -> Option<&KnownEntity> {
        self.entries.get(&address.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by label then address
    pub fn iter_sorted(&self) -> Vec<(&String, &KnownEntity)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.1.label.cmp(&b.1.label).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Merge `other` into this table; entries in `other` win
    pub fn merge(mut self, other: KnownEntities) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Parse a JSON object of `address -> {label, tags}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, KnownEntity> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidEntityTable(e.to_string()))?;

        let mut table = Self::new();
        for (address, entity) in raw {
            if address.trim().is_empty() {
                return Err(Error::InvalidEntityTable("empty address key".to_string()));
            }
            if entity.label.trim().is_empty() {
                return Err(Error::InvalidEntityTable(format!(
                    "entry {} has an empty label",
                    address
                )));
            }
            table.insert(address.trim(), entity);
        }
        Ok(table)
    }

    /// Load a JSON entity table from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&contents)?;
        info!(path = %path.display(), entries = table.len(), "Loaded entity table");
        Ok(table)
    }

    /// Major centralized exchange and DEX contract addresses on EVM chains
    pub fn builtin() -> Self {
        const CEX: &[(&str, &str, &str)] = &[
            ("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be", "Binance", "binance"),
            ("0xd551234ae421e3bcba99a0da6d736074f22192ff", "Binance", "binance"),
            ("0x564286362092d8e7936f0549571a803b203aaced", "Binance", "binance"),
            ("0x0681d8db095565fe8a346fa0277bffde9c0edbbf", "Binance", "binance"),
            ("0xfe9e8709d3215310075d67e3ed32a380ccf451c8", "Binance", "binance"),
            ("0x47ac0fb4f2d84898e4d9e7b4dab3c24507a6d503", "Binance", "binance"),
            ("0xbe0eb53f46cd790cd13851d5eff43d12404d33e8", "Binance", "binance"),
            ("0xf977814e90da44bfa03b6295a0616a897441acec", "Binance", "binance"),
            ("0x28c6c06298d514db089934071355e5743bf21d60", "Binance US", "binance"),
            ("0xa910f92acdaf488fa6ef02174fb86208ad7722ba", "Coinbase", "coinbase"),
            ("0x503828976d22510aad0201ac7ec88293211d23da", "Coinbase", "coinbase"),
            ("0xddfabcdc4d8ffc6d5beaf154f18b778f892a0740", "Coinbase", "coinbase"),
            ("0x71660c4005ba85c37ccec55d0c4493e66fe775d3", "Coinbase", "coinbase"),
            ("0x267be1c1d684f78cb4f6a176c4911b741e4ffdc0", "Coinbase", "coinbase"),
            ("0xf6874c88757721a02f47592140905c4336dfbc61", "Coinbase", "coinbase"),
            ("0x7c195d981abfdc3ddecd2ca0fed0958430488e34", "Coinbase", "coinbase"),
            ("0x6b76f8b1e9e59913bfe758821887311ba1805cab", "Kraken", "kraken"),
            ("0xae2d4617c862309a3d75a0ffb358c7a5009c673f", "Kraken", "kraken"),
            ("0x53d284357ec70ce289d6d64134dfac8e511c8a3d", "Kraken", "kraken"),
            ("0x89e51fa8ca5d66cd220baed62ed01e8951aa7c40", "Kraken", "kraken"),
            ("0x0a869d79a7052c7f1b55a8ebabbea3420f0d1e13", "Kraken", "kraken"),
            ("0xe853c56864a2ebe4576a807d26fdc4a0ada51919", "Kraken", "kraken"),
            ("0x2910543af39aba0cd09dbb2d50200b3e800a63d2", "Kraken", "kraken"),
            ("0x94a1b5cdb22c43faab4abeb5c74999895464ddaf", "Bitfinex", "bitfinex"),
            ("0xcafb10ee663f465f9d10588ac44ed20ed608c11e", "Bitfinex", "bitfinex"),
            ("0x742d35cc6634c0532925a3b844bc454e4438f44e", "Bitfinex", "bitfinex"),
            ("0x876eabf441b2ee5b5b0554fd502a8e0600950cfa", "Bitfinex", "bitfinex"),
            ("0x0eee3e3828a45f7601d5f54bf49bb01d1a9df5ea", "Bitfinex", "bitfinex"),
            ("0x236f9f97e0e62388479bf9e5ba4889e46b0273c3", "OKX", "okx"),
            ("0xa7efae728d2936e78bda97dc267687568dd593f3", "OKX", "okx"),
            ("0x98ec059dc3adfbdd63429454aeb0c990fba4a128", "OKX", "okx"),
            ("0xf89d7b9c864f589bbf53a82105107622b35eaa40", "Bybit", "bybit"),
            ("0xee5b5b923ffce93a870b3104b7ca09c3db80047a", "Bybit", "bybit"),
            ("0x0d0707963952f2fba59dd06f2b425ace40b492fe", "Gate.io", "gate"),
            ("0x1c4b70a3968436b9a0a9cf5205c787eb81bb558c", "Gate.io", "gate"),
            ("0x5c985e89dde482efe97ea9f1950ad149eb73829b", "Huobi", "huobi"),
            ("0x6748f50f686bfbca6fe8ad62b22228b87f31ff2b", "Huobi", "huobi"),
            ("0xeee28d484628d41a82d01e21d12e2e78d69920da", "Huobi", "huobi"),
            ("0x2b5634c42055806a59e9107ed44d43c426e58258", "KuCoin", "kucoin"),
            ("0x689c56aef474df92d44a1b70850f808488f9769c", "KuCoin", "kucoin"),
            ("0xd6216fc19db775df9774a6e33526131da7d19a2c", "KuCoin", "kucoin"),
            ("0x5f65f7b609678448494de4c87521cdf6cef1e932", "Gemini", "gemini"),
            ("0xd24400ae8bfebb18ca49be86258a3c749cf46853", "Gemini", "gemini"),
            ("0x61edcdf5bb737adffe5043706e7c5bb1f1a56eea", "Gemini", "gemini"),
        ];

        const DEX: &[(&str, &str, &[&str])] = &[
            ("0x21a31ee1afc51d94c2efccaa2092ad1028285549", "Binance DEX", &["exchange", "dex", "binance"]),
            ("0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45", "Uniswap Router", &["dex", "uniswap", "router"]),
            ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", "Uniswap V2 Router", &["dex", "uniswap", "router"]),
            ("0xe592427a0aece92de3edee1f18e0157c05861564", "Uniswap V3 Router", &["dex", "uniswap", "router"]),
            ("0xbabe61887f1de2713c6f97e567623453d3c79f67", "Curve", &["dex", "curve", "pool"]),
            ("0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f", "Sushiswap Router", &["dex", "sushiswap", "router"]),
        ];

        let mut table = Self::new();
        for (address, label, venue) in CEX {
            table.insert(address, KnownEntity::new(*label, &["exchange", "cex", "contract", *venue]));
        }
        for (address, label, tags) in DEX {
            let mut entity = KnownEntity::new(*label, tags);
            entity.tags.insert("contract".to_string());
            table.insert(address, entity);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = KnownEntities::new().with_entity(
            "0xABCDEF",
            KnownEntity::new("Treasury", &["treasury"]),
        );
        assert_eq!(table.lookup("0xabcdef").map(|e| e.label.as_str()), Some("Treasury"));
        assert_eq!(table.lookup("0xAbCdEf").map(|e| e.label.as_str()), Some("Treasury"));
        assert!(table.lookup("0x123").is_none());
    }

    #[test]
    fn test_builtin_exchange_tags() {
        let table = KnownEntities::builtin();
        let binance = table
            .lookup("0x3F5CE5FBFE3E9AF3971DD833D26BA9B5C936F0BE")
            .unwrap();
        assert_eq!(binance.label, "Binance");
        assert!(binance.tags.contains("exchange"));
        assert!(binance.tags.contains("cex"));
        assert!(binance.tags.contains("contract"));

        let uniswap = table.lookup("0x7a250d5630b4cf539739df2c5dacb4c659f2488d").unwrap();
        assert!(uniswap.tags.contains("dex"));
        assert!(!uniswap.tags.contains("exchange"));
    }

    #[test]
    fn test_from_json_and_merge() {
        let json = r#"{
            "0xAAA": { "label": "Team Vesting", "tags": ["team", "vesting"] },
            "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be": { "label": "Binance Hot 14" }
        }"#;
        let custom = KnownEntities::from_json_str(json).unwrap();
        assert_eq!(custom.len(), 2);

        let merged = KnownEntities::builtin().merge(custom);
        assert_eq!(merged.lookup("0xaaa").unwrap().label, "Team Vesting");
        let overridden = merged
            .lookup("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be")
            .unwrap();
        assert_eq!(overridden.label, "Binance Hot 14");
        assert!(overridden.tags.is_empty());
    }

    #[test]
    fn test_from_json_rejects_empty_label() {
        let err = KnownEntities::from_json_str(r#"{ "0xaaa": { "label": " " } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidEntityTable(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "0xBBB": {{ "label": "Bridge", "tags": ["bridge"] }} }}"#).unwrap();

        let table = KnownEntities::from_json_file(file.path()).unwrap();
        assert!(table.lookup("0xbbb").unwrap().tags.contains("bridge"));
    }
}
