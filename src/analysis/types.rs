//! Analysis Types
//!
//! 指標レコードと検出結果の型定義

use super::indicators::IDENTITY_FIELDS;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// 1病院・1日付分の指標値
///
/// 同一データセット内のレコードはすべて同じ病院IDと同じ指標キー集合を持つ前提。
/// 日付順に並んでいる必要はない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct MetricRecord {
    /// 病院ID
    pub hospital: String,
    /// 日付文字列
    pub date: String,
    /// 指標名 → 値
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl MetricRecord {
    /// 新しいレコードを作成
    pub fn new(hospital: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            hospital: hospital.into(),
            date: date.into(),
            values: BTreeMap::new(),
        }
    }

    /// 指標値を追加
    pub fn with_value(mut self, indicator: impl Into<String>, value: f64) -> Self {
        self.values.insert(indicator.into(), value);
        self
    }

    /// 指標値を取得
    pub fn value(&self, indicator: &str) -> Option<f64> {
        self.values.get(indicator).copied()
    }

    /// JSONオブジェクトからレコードを組み立てる
    ///
    /// 病院ID（`hospital` または `hospitalName`）と日付は必須。
    /// 数値でない指標セル（文字列・null など）は取り込まず、その指標名を2番目の要素で返す。
    pub fn from_object(fields: Map<String, Value>) -> Result<(Self, Vec<String>), String> {
        let hospital = identity_text(&fields, &["hospital", "hospitalName"])
            .ok_or_else(|| "missing hospital".to_string())?;
        let date = identity_text(&fields, &["date"]).ok_or_else(|| "missing date".to_string())?;

        let mut record = Self::new(hospital, date);
        let mut skipped = Vec::new();
        for (name, cell) in fields {
            if IDENTITY_FIELDS.contains(&name.as_str()) {
                continue;
            }
            match cell.as_f64() {
                Some(value) => {
                    record.values.insert(name, value);
                }
                None => skipped.push(name),
            }
        }

        Ok((record, skipped))
    }
}

impl TryFrom<Map<String, Value>> for MetricRecord {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let (record, skipped) = Self::from_object(fields)?;
        for indicator in skipped {
            warn!(hospital = %record.hospital, %indicator, "Skipping non-numeric indicator value");
        }
        Ok(record)
    }
}

/// 候補キーのうち最初の空でない識別値（文字列または数値）
fn identity_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// 検出結果の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// 単一指標異常
    SingleIndicator,
    /// 関連性異常
    CrossValidation,
    /// AI検出
    Ai,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::SingleIndicator => "single_indicator",
            FindingKind::CrossValidation => "cross_validation",
            FindingKind::Ai => "ai",
        }
    }
}

impl std::str::FromStr for FindingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "single_indicator" => Ok(FindingKind::SingleIndicator),
            "cross" | "cross_validation" => Ok(FindingKind::CrossValidation),
            "ai" => Ok(FindingKind::Ai),
            other => Err(format!("unknown finding kind: {}", other)),
        }
    }
}

/// 単一指標ルール違反
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleIndicatorFinding {
    pub hospital: String,
    pub date: String,
    pub indicator: String,
    pub value: f64,
    pub rule_name: String,
}

/// 2指標間の整合性ルール違反
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationFinding {
    pub hospital: String,
    pub date: String,
    pub message: String,
    /// ルールが参照した2指標の生の値
    pub values: BTreeMap<String, f64>,
}

/// AI分類器が報告した異常
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiFinding {
    pub hospital: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub message: String,
}

/// 検出結果
///
/// 不変の値。集約処理は追加のみを行い、変更・重複排除はしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Finding {
    SingleIndicator(SingleIndicatorFinding),
    CrossValidation(CrossValidationFinding),
    Ai(AiFinding),
}

impl Finding {
    pub fn kind(&self) -> FindingKind {
        match self {
            Finding::SingleIndicator(_) => FindingKind::SingleIndicator,
            Finding::CrossValidation(_) => FindingKind::CrossValidation,
            Finding::Ai(_) => FindingKind::Ai,
        }
    }

    pub fn hospital(&self) -> &str {
        match self {
            Finding::SingleIndicator(f) => &f.hospital,
            Finding::CrossValidation(f) => &f.hospital,
            Finding::Ai(f) => &f.hospital,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Finding::SingleIndicator(f) => &f.date,
            Finding::CrossValidation(f) => &f.date,
            Finding::Ai(f) => &f.date,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::SingleIndicator(s) => {
                write!(f, "{}: {} ({})", s.indicator, s.value, s.rule_name)
            }
            Finding::CrossValidation(c) => {
                let values = c
                    .values
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{} ({})", c.message, values)
            }
            Finding::Ai(a) => match (&a.indicator, a.value) {
                (Some(indicator), Some(value)) => {
                    write!(f, "{} [{}: {}]", a.message, indicator, value)
                }
                (Some(indicator), None) => write!(f, "{} [{}]", a.message, indicator),
                _ => write!(f, "{}", a.message),
            },
        }
    }
}
