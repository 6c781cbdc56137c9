//! Sequence Index
//!
//! 「前回値」の解決。前回とは入力順で直前のレコードであり、日付順ではない。
//! 日付順の比較が必要な場合、呼び出し側で事前にソートすること。

use super::types::MetricRecord;
use std::collections::HashMap;

/// 病院ID+日付 → 入力内の位置 の索引
///
/// 同じキーが複数ある場合は最初の出現位置を使う。
pub struct SequenceIndex<'a> {
    records: &'a [MetricRecord],
    positions: HashMap<(&'a str, &'a str), usize>,
}

impl<'a> SequenceIndex<'a> {
    /// データセットから索引を構築
    pub fn new(records: &'a [MetricRecord]) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            positions
                .entry((record.hospital.as_str(), record.date.as_str()))
                .or_insert(idx);
        }

        Self { records, positions }
    }

    /// レコードの位置を取得
    pub fn position_of(&self, record: &MetricRecord) -> Option<usize> {
        self.positions
            .get(&(record.hospital.as_str(), record.date.as_str()))
            .copied()
    }

    /// 直前レコードの指標値
    ///
    /// 先頭・未登録・値なしの場合は 0 を返す。
    pub fn previous_value(&self, record: &MetricRecord, indicator: &str) -> f64 {
        match self.position_of(record) {
            Some(idx) if idx > 0 => self.records[idx - 1].value(indicator).unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// 単発の前回値ルックアップ
pub fn previous_value(records: &[MetricRecord], current: &MetricRecord, indicator: &str) -> f64 {
    SequenceIndex::new(records).previous_value(current, indicator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, value: f64) -> MetricRecord {
        MetricRecord::new("A", date).with_value("入院人次", value)
    }

    #[test]
    fn test_first_record_has_no_predecessor() {
        let records = vec![record("2024-01", 10.0), record("2024-02", 12.0)];
        assert_eq!(previous_value(&records, &records[0], "入院人次"), 0.0);
        assert_eq!(previous_value(&records, &records[1], "入院人次"), 10.0);
    }

    #[test]
    fn test_positional_not_chronological() {
        let records = vec![record("2024-03", 30.0), record("2024-01", 10.0)];
        // 2024-01 is positioned after 2024-03, so its predecessor is 2024-03
        assert_eq!(previous_value(&records, &records[1], "入院人次"), 30.0);
    }

    #[test]
    fn test_unknown_record_returns_zero() {
        let records = vec![record("2024-01", 10.0)];
        let stranger = record("2030-01", 99.0);
        assert_eq!(previous_value(&records, &stranger, "入院人次"), 0.0);
    }

    #[test]
    fn test_duplicate_key_uses_first_occurrence() {
        let records = vec![
            record("2024-01", 10.0),
            record("2024-02", 20.0),
            record("2024-02", 40.0),
        ];
        let index = SequenceIndex::new(&records);
        assert_eq!(index.position_of(&records[2]), Some(1));
        assert_eq!(index.previous_value(&records[2], "入院人次"), 10.0);
    }

    #[test]
    fn test_missing_indicator_on_predecessor() {
        let records = vec![MetricRecord::new("A", "2024-01"), record("2024-02", 5.0)];
        assert_eq!(previous_value(&records, &records[1], "入院人次"), 0.0);
    }
}
