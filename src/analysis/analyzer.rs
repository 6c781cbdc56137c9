//! Anomaly Analyzer
//!
//! 単一指標・整合性・AIの3検知器を順に実行し、結果を1つのリストに連結する。

use super::ai::AiAnomalyDetector;
use super::config::AnalysisConfig;
use super::rules::RuleSet;
use super::types::{Finding, MetricRecord};
use super::{cross, single};
use crate::error::Result;
use crate::llm::LlmConfig;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// 異常解析器
///
/// ルールセットと設定は構築時のスナップショットで、解析中に変更されない。
/// 異なるデータセットの解析は状態を共有しないので並行に実行できる。
pub struct AnomalyAnalyzer {
    rules: Arc<RuleSet>,
    detector: AiAnomalyDetector,
}

impl AnomalyAnalyzer {
    /// 設定とルールセットから作成
    pub fn new(config: AnalysisConfig, llm: &LlmConfig, rules: RuleSet) -> Result<Self> {
        let detector = AiAnomalyDetector::new(config, llm)?;
        Ok(Self::with_detector(rules, detector))
    }

    /// 検知器を指定して作成
    pub fn with_detector(rules: RuleSet, detector: AiAnomalyDetector) -> Self {
        Self {
            rules: Arc::new(rules),
            detector,
        }
    }

    /// ルールのみで解析する解析器
    pub fn rules_only(rules: RuleSet) -> Self {
        Self::with_detector(rules, AiAnomalyDetector::disabled())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn detector(&self) -> &AiAnomalyDetector {
        &self.detector
    }

    /// ルールベースの検出（同期・決定的）
    ///
    /// 単一指標の結果の後に整合性の結果が続く。
    pub fn evaluate_rules(&self, records: &[MetricRecord]) -> Vec<Finding> {
        let mut findings = single::evaluate(records, &self.rules.single);
        findings.extend(cross::evaluate(records, &self.rules.cross));
        findings
    }

    /// 1データセットを解析
    ///
    /// 空のデータセットは空の結果（AIも呼ばない）。AI検出の失敗は
    /// ルールベースの結果に影響しない。
    #[instrument(skip_all, fields(hospital = records.first().map(|r| r.hospital.as_str()).unwrap_or(""), records = records.len()))]
    pub async fn analyze(&self, records: &[MetricRecord]) -> Vec<Finding> {
        if records.is_empty() {
            return Vec::new();
        }

        let mut findings = self.evaluate_rules(records);
        let rule_findings = findings.len();

        if self.detector.is_enabled() {
            match self.detector.detect(records).await {
                Ok(ai_findings) => findings.extend(ai_findings),
                Err(e) => error!(error = %e, "AI anomaly detection failed, skipping AI findings"),
            }
        }

        info!(
            rule_findings,
            ai_findings = findings.len() - rule_findings,
            "Dataset analysis completed"
        );
        findings
    }

    /// 複数データセットを並行に解析し、データセット順に連結
    ///
    /// データセット間の関係は評価しない。
    pub async fn analyze_datasets(&self, datasets: &[Vec<MetricRecord>]) -> Vec<Finding> {
        let results = join_all(datasets.iter().map(|records| self.analyze(records))).await;
        results.into_iter().flatten().collect()
    }
}

/// 混在したレコードを病院ごとのデータセットに分割
///
/// 病院は最初に現れた順、各データセット内は入力順を保つ。
pub fn partition_by_hospital(records: Vec<MetricRecord>) -> Vec<Vec<MetricRecord>> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut datasets: Vec<Vec<MetricRecord>> = Vec::new();

    for record in records {
        let slot = *slots.entry(record.hospital.clone()).or_insert_with(|| {
            datasets.push(Vec::new());
            datasets.len() - 1
        });
        datasets[slot].push(record);
    }

    datasets
}
