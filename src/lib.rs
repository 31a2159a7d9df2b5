//! Holder Monitor Library
//!
//! Token holder concentration analytics: inequality metrics, whale
//! classification, multi-factor risk scoring and rule-based alerts.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use analysis::{AnalysisReport, HolderAnalyzer, HolderSnapshot, KnownEntities, RiskPolicy};
pub use config::Config;
pub use error::{Error, Result};
