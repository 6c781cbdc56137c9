//! Single-Indicator Rule Engine
//!
//! 各レコード × 各指標 × 各有効ルールを評価する。

use super::indicators::IndicatorSet;
use super::rules::{RuleContext, SingleIndicatorRule};
use super::sequence::SequenceIndex;
use super::types::{Finding, MetricRecord, SingleIndicatorFinding};

/// 単一指標ルールを評価
///
/// 結果はレコード順・指標順・ルール順。同じ(レコード, 指標)で複数ルールが
/// 失敗した場合はそれぞれ別の結果になる。値のない指標は評価しない。
pub fn evaluate<'a, I>(records: &[MetricRecord], rules: I) -> Vec<Finding>
where
    I: IntoIterator<Item = &'a SingleIndicatorRule>,
{
    let rules: Vec<&SingleIndicatorRule> = rules.into_iter().filter(|r| r.enabled).collect();
    let indicators = IndicatorSet::from_records(records);
    if rules.is_empty() || indicators.is_empty() {
        return Vec::new();
    }

    let index = SequenceIndex::new(records);
    let mut findings = Vec::new();

    for record in records {
        for indicator in indicators.iter() {
            let Some(value) = record.value(indicator) else {
                continue;
            };
            let ctx = RuleContext {
                previous: index.previous_value(record, indicator),
            };

            for rule in &rules {
                if !rule.validate(value, &ctx) {
                    findings.push(Finding::SingleIndicator(SingleIndicatorFinding {
                        hospital: record.hospital.clone(),
                        date: record.date.clone(),
                        indicator: indicator.to_string(),
                        value,
                        rule_name: rule.name.clone(),
                    }));
                }
            }
        }
    }

    findings
}
