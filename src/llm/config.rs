//! LLMプロバイダーの接続設定

use crate::llm::error::{LlmError, LlmResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// プロバイダー接続設定
///
/// APIキーとシステムプロンプトは `AnalysisConfig` 側が持つ。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// チャット補完エンドポイント
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// モデル名
    #[serde(default = "default_model")]
    pub model: String,
    /// 1回の試行あたりのタイムアウト（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 最大試行回数（初回を含む）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// リトライ待機の単位（ミリ秒）。n回目の失敗後は n × 単位 だけ待つ
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_endpoint() -> String {
    "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string()
}

fn default_model() -> String {
    "deepseek-r1-250120".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

impl LlmConfig {
    /// エンドポイントとモデルを指定して作成
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// 試行ごとのタイムアウトを取得
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// リトライ待機の単位を取得
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// 設定を検証
    pub fn validate(&self) -> LlmResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(LlmError::ConfigError("endpoint must not be empty".to_string()));
        }

        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigError("model must not be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(LlmError::ConfigError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(LlmError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}
