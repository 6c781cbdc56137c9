//! Indicator Extraction
//!
//! データセットから評価対象の指標名を導出する

use super::types::MetricRecord;

/// 指標から除外する識別フィールド
pub const IDENTITY_FIELDS: [&str; 3] = ["hospital", "hospitalName", "date"];

/// 単一指標評価の対象となる指標名の集合
///
/// 解析呼び出しごとに導出し、データセット間で共有しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSet {
    names: Vec<String>,
}

impl IndicatorSet {
    /// 先頭レコードのキー集合から指標を導出
    ///
    /// レコード間のスキーマ不一致は検出しない（呼び出し側の責務）。
    pub fn from_records(records: &[MetricRecord]) -> Self {
        let Some(first) = records.first() else {
            return Self::default();
        };

        let names = first
            .values
            .keys()
            .filter(|name| !IDENTITY_FIELDS.contains(&name.as_str()))
            .cloned()
            .collect();

        Self { names }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset() {
        assert!(IndicatorSet::from_records(&[]).is_empty());
    }

    #[test]
    fn test_uses_first_record_only() {
        let records = vec![
            MetricRecord::new("A", "2024-01").with_value("手术人数", 3.0),
            MetricRecord::new("A", "2024-02")
                .with_value("手术人数", 4.0)
                .with_value("医疗收入", 9.0),
        ];

        let set = IndicatorSet::from_records(&records);
        assert_eq!(set.len(), 1);
        assert!(set.contains("手术人数"));
        assert!(!set.contains("医疗收入"));
    }

    #[test]
    fn test_excludes_identity_fields() {
        let records = vec![MetricRecord::new("A", "2024-01")
            .with_value("date", 1.0)
            .with_value("hospital", 2.0)
            .with_value("入院人次", 10.0)];

        let set = IndicatorSet::from_records(&records);
        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names, vec!["入院人次"]);
    }
}
