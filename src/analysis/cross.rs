//! Cross-Validation Rule Engine
//!
//! 各レコード × 各有効な2指標ルールを評価する。

use super::rules::CrossValidationRule;
use super::types::{CrossValidationFinding, Finding, MetricRecord};
use std::collections::BTreeMap;

/// 2指標間の整合性ルールを評価
///
/// 結果はレコード順・ルール順。どちらかの指標がレコードにない場合は評価しない。
pub fn evaluate<'a, I>(records: &[MetricRecord], rules: I) -> Vec<Finding>
where
    I: IntoIterator<Item = &'a CrossValidationRule>,
{
    let rules: Vec<&CrossValidationRule> = rules.into_iter().filter(|r| r.enabled).collect();
    let mut findings = Vec::new();

    for record in records {
        for rule in &rules {
            let (Some(value1), Some(value2)) =
                (record.value(&rule.indicator1), record.value(&rule.indicator2))
            else {
                continue;
            };

            if !rule.validate(value1, value2) {
                let values = BTreeMap::from([
                    (rule.indicator1.clone(), value1),
                    (rule.indicator2.clone(), value2),
                ]);
                findings.push(Finding::CrossValidation(CrossValidationFinding {
                    hospital: record.hospital.clone(),
                    date: record.date.clone(),
                    message: rule.message.clone(),
                    values,
                }));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rules::RuleSet;

    #[test]
    fn test_discharge_without_income() {
        let records = vec![MetricRecord::new("A", "2024-01")
            .with_value("出院人次", 5.0)
            .with_value("住院收入", 0.0)];

        let findings = evaluate(&records, &RuleSet::defaults().cross);
        assert_eq!(findings.len(), 1);
        match &findings[0] {
            Finding::CrossValidation(f) => {
                assert_eq!(f.values.get("出院人次"), Some(&5.0));
                assert_eq!(f.values.get("住院收入"), Some(&0.0));
            }
            other => panic!("unexpected finding: {:?}", other),
        }
    }

    #[test]
    fn test_no_discharges_no_finding() {
        let records = vec![MetricRecord::new("A", "2024-01")
            .with_value("出院人次", 0.0)
            .with_value("住院收入", -100.0)];
        assert!(evaluate(&records, &RuleSet::defaults().cross).is_empty());
    }

    #[test]
    fn test_missing_indicator_skips_rule() {
        let records = vec![MetricRecord::new("A", "2024-01").with_value("手术人数", 3.0)];
        assert!(evaluate(&records, &RuleSet::defaults().cross).is_empty());
    }

    #[test]
    fn test_record_major_order() {
        let records = vec![
            MetricRecord::new("A", "2024-01")
                .with_value("出院人次", 1.0)
                .with_value("住院收入", 0.0)
                .with_value("手术人数", 1.0)
                .with_value("医疗收入", 10.0),
            MetricRecord::new("A", "2024-02")
                .with_value("出院人次", 1.0)
                .with_value("住院收入", 0.0)
                .with_value("手术人数", 0.0)
                .with_value("医疗收入", 0.0),
        ];

        let rules = RuleSet::defaults();
        let findings = evaluate(&records, &rules.cross);
        let summary: Vec<(&str, &str)> = findings
            .iter()
            .map(|f| match f {
                Finding::CrossValidation(c) => (c.date.as_str(), c.message.as_str()),
                _ => unreachable!(),
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("2024-01", rules.cross[0].message.as_str()),
                ("2024-01", rules.cross[1].message.as_str()),
                ("2024-02", rules.cross[0].message.as_str()),
            ]
        );
    }
}
