//! # hospital-anomaly
//!
//! Anomaly analysis for hospital financial and operational time series.
//!
//! Each dataset (one hospital's records in reporting order) is checked by three
//! detectors: single-indicator rules against the previous period, cross-validation
//! rules between related indicators in the same record, and an optional remote
//! AI classifier. Their findings are concatenated in that order.

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;

pub use analysis::{
    partition_by_hospital, AnalysisConfig, AnomalyAnalyzer, Finding, FindingFilter, FindingKind,
    MetricRecord, RuleSet,
};
pub use config::{AppConfig, ConfigLoader};
pub use error::{Error, Result};
