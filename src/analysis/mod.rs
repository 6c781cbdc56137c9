//! Anomaly Analysis Module
//!
//! 病院の財務・運営指標の時系列に対する異常検知エンジン

pub mod ai;
pub mod analyzer;
pub mod config;
pub mod cross;
pub mod dataset;
pub mod extract;
pub mod filter;
pub mod indicators;
pub mod rules;
pub mod sequence;
pub mod single;
pub mod types;

pub use ai::AiAnomalyDetector;
pub use analyzer::{partition_by_hospital, AnomalyAnalyzer};
pub use config::AnalysisConfig;
pub use dataset::{load_dataset, parse_dataset};
pub use extract::{extract_first_array, parse_ai_findings};
pub use filter::FindingFilter;
pub use indicators::IndicatorSet;
pub use rules::{
    CrossCheck, CrossValidationRule, RuleContext, RuleFlag, RuleSet, SingleCheck,
    SingleIndicatorRule,
};
pub use sequence::{previous_value, SequenceIndex};
pub use types::{
    AiFinding, CrossValidationFinding, Finding, FindingKind, MetricRecord, SingleIndicatorFinding,
};
