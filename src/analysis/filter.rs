//! Finding Filters
//!
//! 種別と日付範囲による検出結果の絞り込み

use super::types::{Finding, FindingKind};
use chrono::NaiveDate;

/// 検出結果のフィルタ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindingFilter {
    pub kind: Option<FindingKind>,
    /// 開始日（含む）
    pub from: Option<NaiveDate>,
    /// 終了日（含む）
    pub to: Option<NaiveDate>,
}

impl FindingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: FindingKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// 条件に一致するか
    ///
    /// 日付範囲が指定されている場合、解釈できない日付の結果は除外する。
    pub fn matches(&self, finding: &Finding) -> bool {
        if let Some(kind) = self.kind {
            if finding.kind() != kind {
                return false;
            }
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }

        let Some(date) = parse_date(finding.date()) else {
            return false;
        };

        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    pub fn apply<'a>(&self, findings: &'a [Finding]) -> Vec<&'a Finding> {
        findings.iter().filter(|f| self.matches(f)).collect()
    }
}

/// 日付文字列を解釈（`YYYY-MM-DD` / `YYYY/MM/DD` / `YYYY-MM` は月初）
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d"))
        .ok()
}
