//! Analysis Configuration
//!
//! 解析1回分の設定スナップショット

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// 解析設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// APIキー（空ならAI検出は無効）
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    /// 異常閾値（現行ルールでは未使用、外部契約の一部）
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,
    /// 時系列を意識したプロンプトを使うか
    #[serde(default = "default_timeseries_analysis")]
    pub timeseries_analysis: bool,
    /// AI検出器に渡すシステムプロンプト
    #[serde(default)]
    pub system_prompt: String,
}

fn default_anomaly_threshold() -> f64 {
    1.0
}

fn default_timeseries_analysis() -> bool {
    true
}

impl AnalysisConfig {
    /// APIキーとシステムプロンプトを指定して作成
    pub fn with_api_key(api_key: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key.into().into_boxed_str())),
            system_prompt: system_prompt.into(),
            ..Self::default()
        }
    }

    /// 空でないAPIキー
    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }

    /// AI検出が有効か
    pub fn ai_enabled(&self) -> bool {
        self.api_key().is_some()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            anomaly_threshold: default_anomaly_threshold(),
            timeseries_analysis: default_timeseries_analysis(),
            system_prompt: String::new(),
        }
    }
}
