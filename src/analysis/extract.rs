//! AI Response Extraction
//!
//! 自由文の応答から最初の `[` に続くJSON配列を読み取り、AI検出結果に正規化する。
//! 失敗は呼び出し元に伝播させず、「AI検出なし」として扱う。

use super::types::{AiFinding, Finding};
use serde_json::{Map, Value};
use tracing::warn;

pub const UNKNOWN_HOSPITAL: &str = "unknown hospital";
pub const UNKNOWN_DATE: &str = "unknown date";
pub const DEFAULT_MESSAGE: &str = "anomaly detected";

/// 最初の `[` から始まるJSON配列を読み取る
///
/// `[` が無ければ `None`。最初の値だけを読み、読めなくても後続の `[` は探さない。
pub fn extract_first_array(text: &str) -> Option<serde_json::Result<Vec<Value>>> {
    let start = text.find('[')?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Vec<Value>>()
        .next()
}

/// 応答テキストをAI検出結果に変換
pub fn parse_ai_findings(content: &str) -> Vec<Finding> {
    match extract_first_array(content) {
        Some(Ok(items)) => items.iter().map(normalize).map(Finding::Ai).collect(),
        Some(Err(e)) => {
            warn!(error = %e, "Failed to parse array extracted from AI response");
            Vec::new()
        }
        None => {
            warn!("No JSON array found in AI response content");
            Vec::new()
        }
    }
}

/// 1要素を正規化
///
/// フィールド名の別名を許容し、欠けた識別情報は既定値で埋める。
/// オブジェクトでない要素は空オブジェクトとして扱う。
pub fn normalize(item: &Value) -> AiFinding {
    let empty = Map::new();
    let obj = item.as_object().unwrap_or(&empty);

    AiFinding {
        hospital: first_text(obj, &["hospitalName", "hospital"])
            .unwrap_or_else(|| UNKNOWN_HOSPITAL.to_string()),
        date: first_text(obj, &["date"]).unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        indicator: first_text(obj, &["indicator", "field"]),
        value: obj.get("value").and_then(Value::as_f64),
        message: first_text(obj, &["description", "message"])
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
    }
}

/// 候補キーのうち最初の空でない値（文字列または数値）
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
