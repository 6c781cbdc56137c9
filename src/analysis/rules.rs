//! Analysis Rules
//!
//! 単一指標ルールと2指標間の整合性ルール、およびそれらをまとめた不変のルールセット。
//! 既定ルールの判定はデータとして表現し、設定から読み込めるようにする。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 単一指標ルールの評価コンテキスト
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleContext {
    /// 直前レコードの値（なければ 0）
    pub previous: f64,
}

/// カスタム単一指標判定（true = 正常）
pub type SingleCheckFn = Arc<dyn Fn(f64, &RuleContext) -> bool + Send + Sync>;

/// カスタム2指標判定（true = 正常）
pub type CrossCheckFn = Arc<dyn Fn(f64, f64) -> bool + Send + Sync>;

/// 単一指標ルールの判定方法
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum SingleCheck {
    /// 前回値からの変動率が閾値未満なら正常。前回値が 0 の場合は常に正常
    Volatility { threshold: f64 },
    #[serde(skip)]
    Custom(SingleCheckFn),
}

impl SingleCheck {
    pub fn passes(&self, current: f64, ctx: &RuleContext) -> bool {
        match self {
            SingleCheck::Volatility { threshold } => {
                if ctx.previous == 0.0 {
                    return true;
                }
                (current - ctx.previous).abs() / ctx.previous < *threshold
            }
            SingleCheck::Custom(check) => check(current, ctx),
        }
    }
}

impl fmt::Debug for SingleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleCheck::Volatility { threshold } => f
                .debug_struct("Volatility")
                .field("threshold", threshold)
                .finish(),
            SingleCheck::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// 2指標ルールの判定方法
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CrossCheck {
    /// 1つ目が正なら2つ目も正でなければならない
    PositiveRequiresPositive,
    /// 1つ目が正なら2つ目は `minimum` 以上でなければならない
    PositiveRequiresAtLeast { minimum: f64 },
    #[serde(skip)]
    Custom(CrossCheckFn),
}

impl CrossCheck {
    pub fn passes(&self, value1: f64, value2: f64) -> bool {
        match self {
            CrossCheck::PositiveRequiresPositive => !(value1 > 0.0 && value2 <= 0.0),
            CrossCheck::PositiveRequiresAtLeast { minimum } => {
                !(value1 > 0.0 && value2 < *minimum)
            }
            CrossCheck::Custom(check) => check(value1, value2),
        }
    }
}

impl fmt::Debug for CrossCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossCheck::PositiveRequiresPositive => f.write_str("PositiveRequiresPositive"),
            CrossCheck::PositiveRequiresAtLeast { minimum } => f
                .debug_struct("PositiveRequiresAtLeast")
                .field("minimum", minimum)
                .finish(),
            CrossCheck::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// 単一指標ルール
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleIndicatorRule {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub check: SingleCheck,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl SingleIndicatorRule {
    pub fn new(name: impl Into<String>, description: impl Into<String>, check: SingleCheck) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check,
            enabled: true,
        }
    }

    /// 任意の判定関数からルールを作成
    pub fn custom<F>(name: impl Into<String>, description: impl Into<String>, check: F) -> Self
    where
        F: Fn(f64, &RuleContext) -> bool + Send + Sync + 'static,
    {
        Self::new(name, description, SingleCheck::Custom(Arc::new(check)))
    }

    /// 既定の変動率チェック（閾値 30%）
    pub fn volatility() -> Self {
        Self::new(
            "volatility check",
            "Flags an indicator whose change from the previous record reaches 30%",
            SingleCheck::Volatility { threshold: 0.3 },
        )
    }

    /// true = 正常
    pub fn validate(&self, current: f64, ctx: &RuleContext) -> bool {
        self.check.passes(current, ctx)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// 2指標間の整合性ルール
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationRule {
    pub indicator1: String,
    pub indicator2: String,
    #[serde(flatten)]
    pub check: CrossCheck,
    pub message: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl CrossValidationRule {
    pub fn new(
        indicator1: impl Into<String>,
        indicator2: impl Into<String>,
        check: CrossCheck,
        message: impl Into<String>,
    ) -> Self {
        Self {
            indicator1: indicator1.into(),
            indicator2: indicator2.into(),
            check,
            message: message.into(),
            enabled: true,
        }
    }

    /// 任意の判定関数からルールを作成
    pub fn custom<F>(
        indicator1: impl Into<String>,
        indicator2: impl Into<String>,
        message: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(f64, f64) -> bool + Send + Sync + 'static,
    {
        Self::new(indicator1, indicator2, CrossCheck::Custom(Arc::new(check)), message)
    }

    /// 出院人次 > 0 なのに 住院收入 <= 0
    pub fn discharges_without_inpatient_income() -> Self {
        Self::new(
            "出院人次",
            "住院收入",
            CrossCheck::PositiveRequiresPositive,
            "discharge count is positive but hospitalization income is zero or negative",
        )
    }

    /// 手术人数 > 0 なのに 医疗收入 < 10000
    pub fn surgery_with_low_medical_income() -> Self {
        Self::new(
            "手术人数",
            "医疗收入",
            CrossCheck::PositiveRequiresAtLeast { minimum: 10_000.0 },
            "surgeries recorded but medical income is abnormally low",
        )
    }

    /// true = 正常
    pub fn validate(&self, value1: f64, value2: f64) -> bool {
        self.check.passes(value1, value2)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

fn enabled_by_default() -> bool {
    true
}

/// ルールの有効フラグ（設定からの上書き用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFlag {
    pub enabled: bool,
}

/// 解析1回分のルールスナップショット
///
/// 解析中は読み取り専用。設定変更は新しい `RuleSet` を作ることで反映する。
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub single: Vec<SingleIndicatorRule>,
    pub cross: Vec<CrossValidationRule>,
}

impl RuleSet {
    pub fn new(single: Vec<SingleIndicatorRule>, cross: Vec<CrossValidationRule>) -> Self {
        Self { single, cross }
    }

    /// 既定ルール（変動率チェック + 2つの整合性チェック）
    pub fn defaults() -> Self {
        Self::new(
            vec![SingleIndicatorRule::volatility()],
            vec![
                CrossValidationRule::discharges_without_inpatient_income(),
                CrossValidationRule::surgery_with_low_medical_income(),
            ],
        )
    }

    /// 有効フラグを位置で上書きした新しいルールセットを返す
    ///
    /// リストが与えられた場合、対応する要素のないルールは無効になる。
    /// `None` の側は元の有効フラグを維持する。
    pub fn with_flags(&self, single: Option<&[RuleFlag]>, cross: Option<&[RuleFlag]>) -> Self {
        let single_rules = self
            .single
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let enabled = match single {
                    Some(flags) => flags.get(idx).map(|f| f.enabled).unwrap_or(false),
                    None => rule.enabled,
                };
                rule.clone().with_enabled(enabled)
            })
            .collect();

        let cross_rules = self
            .cross
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let enabled = match cross {
                    Some(flags) => flags.get(idx).map(|f| f.enabled).unwrap_or(false),
                    None => rule.enabled,
                };
                rule.clone().with_enabled(enabled)
            })
            .collect();

        Self::new(single_rules, cross_rules)
    }

    pub fn enabled_single(&self) -> impl Iterator<Item = &SingleIndicatorRule> {
        self.single.iter().filter(|rule| rule.enabled)
    }

    pub fn enabled_cross(&self) -> impl Iterator<Item = &CrossValidationRule> {
        self.cross.iter().filter(|rule| rule.enabled)
    }
}
