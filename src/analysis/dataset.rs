//! Dataset Loading
//!
//! 取り込み済み（正規化済み）のレコード列をJSONから読み込む。

use super::types::MetricRecord;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// JSON文字列からデータセットを読み込む
///
/// 配列でない入力、オブジェクトでない要素、病院IDまたは日付の欠けたレコードは `InvalidDataset`。
/// 数値でない指標セル（文字列・null）は警告を出して読み飛ばし、残りの指標は評価対象に残す。
pub fn parse_dataset(json: &str) -> Result<Vec<MetricRecord>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::invalid_dataset(format!("malformed JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(Error::invalid_dataset("expected a JSON array of records"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let Value::Object(fields) = item else {
                return Err(Error::invalid_dataset(format!("record {}: expected an object", idx)));
            };
            let (record, skipped) = MetricRecord::from_object(fields)
                .map_err(|e| Error::invalid_dataset(format!("record {}: {}", idx, e)))?;

            for indicator in skipped {
                warn!(record = idx, %indicator, "Skipping non-numeric indicator value");
            }
            Ok(record)
        })
        .collect()
}

/// ファイルからデータセットを読み込む
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<MetricRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    parse_dataset(&content)
        .map_err(|e| match e {
            Error::InvalidDataset(msg) => {
                Error::invalid_dataset(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset() {
        let records = parse_dataset(
            r#"[
                {"hospitalName": "A", "date": "2024-01", "手术人数": 2, "医疗收入": 50000},
                {"hospital": "A", "date": "2024-02", "手术人数": 3, "医疗收入": 42000.5}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value("医疗收入"), Some(42000.5));
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_dataset("[]").unwrap().is_empty());
    }

    #[test]
    fn test_non_array_is_invalid() {
        let err = parse_dataset(r#"{"hospital": "A"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidDataset(_)));
    }

    #[test]
    fn test_non_numeric_cells_are_skipped() {
        let records = parse_dataset(
            r#"[
                {"hospital": "A", "date": "2024-01", "手术人数": "two", "备注": null, "入院人次": 7},
                {"hospital": "A", "hospitalName": "A", "date": "2024-02", "入院人次": 9}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("手术人数"), None);
        assert_eq!(records[0].value("入院人次"), Some(7.0));
        assert_eq!(records[1].values.len(), 1);
    }

    #[test]
    fn test_record_without_identity_is_invalid() {
        let err = parse_dataset(r#"[{"hospital": "A", "date": "2024-01"}, {"hospital": "A"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("record 1: missing date"));

        let err = parse_dataset(r#"[{"hospital": "A", "date": "2024-01"}, 42]"#).unwrap_err();
        assert!(matches!(err, Error::InvalidDataset(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        std::fs::write(&path, r#"[{"hospital": "A", "date": "2024-01", "入院人次": 7}]"#).unwrap();

        let records = load_dataset(&path).unwrap();
        assert_eq!(records[0].value("入院人次"), Some(7.0));
    }
}
