//! AI Anomaly Detector
//!
//! データセット全体を外部の分類器に送り、応答から異常を抽出する。
//! リモート呼び出しの失敗はリトライ後に空の結果へ縮退し、解析全体は止めない。

use super::config::AnalysisConfig;
use super::extract::parse_ai_findings;
use super::types::{Finding, MetricRecord};
use crate::error::Result;
use crate::llm::{
    key_prefix, ChatProvider, ChatRequest, HttpChatProvider, LlmConfig, LlmError, LlmResult,
    RetryPolicy,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const USER_PROMPT_PREFIX: &str = "Analyze this data for anomalies: ";

const TIMESERIES_HINT: &str = "Each hospital's records are listed in reporting order. \
Weigh period-over-period movements as well as values that are implausible on their own.\n";

/// AI異常検知器
pub struct AiAnomalyDetector {
    config: AnalysisConfig,
    model: String,
    retry: RetryPolicy,
    provider: Option<Arc<dyn ChatProvider>>,
}

impl AiAnomalyDetector {
    /// 設定からHTTPプロバイダー付きで作成
    ///
    /// APIキーが空の場合はプロバイダーを作らず、検知器は何もしない。
    pub fn new(config: AnalysisConfig, llm: &LlmConfig) -> Result<Self> {
        let provider: Option<Arc<dyn ChatProvider>> = match config.api_key() {
            Some(key) => Some(Arc::new(HttpChatProvider::new(llm, key.clone())?)),
            None => None,
        };

        Ok(Self::build(config, llm, provider))
    }

    /// 任意のプロバイダーを使って作成
    pub fn with_provider(
        config: AnalysisConfig,
        llm: &LlmConfig,
        provider: Arc<dyn ChatProvider>,
    ) -> Self {
        Self::build(config, llm, Some(provider))
    }

    /// AI検出を行わない検知器
    pub fn disabled() -> Self {
        Self::build(AnalysisConfig::default(), &LlmConfig::default(), None)
    }

    fn build(
        config: AnalysisConfig,
        llm: &LlmConfig,
        provider: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        let retry = RetryPolicy::new(llm.max_attempts, llm.retry_backoff(), llm.timeout());
        Self {
            config,
            model: llm.model.clone(),
            retry,
            provider,
        }
    }

    /// AI検出が有効か（APIキーあり・プロバイダーあり）
    pub fn is_enabled(&self) -> bool {
        self.config.ai_enabled() && self.provider.is_some()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// ユーザープロンプトを組み立てる
    pub fn build_user_prompt(&self, records: &[MetricRecord]) -> Result<String> {
        let data = serde_json::to_string(records)?;
        let hint = if self.config.timeseries_analysis {
            TIMESERIES_HINT
        } else {
            ""
        };
        Ok(format!("{}{}{}", hint, USER_PROMPT_PREFIX, data))
    }

    /// 分類器へのリクエストを組み立てる
    pub fn build_request(&self, records: &[MetricRecord]) -> Result<ChatRequest> {
        Ok(ChatRequest::with_system(
            self.model.clone(),
            self.config.system_prompt.clone(),
            self.build_user_prompt(records)?,
        ))
    }

    /// データセットのAI検出を実行
    ///
    /// リモート呼び出しの失敗（ネットワーク、タイムアウト、非成功ステータス、
    /// 不正な応答）はすべてリトライ後に空の結果になる。
    /// `Err` はリクエスト自体を組み立てられなかった場合のみ。
    pub async fn detect(&self, records: &[MetricRecord]) -> Result<Vec<Finding>> {
        let Some(provider) = self.provider.as_ref().filter(|_| self.config.ai_enabled()) else {
            debug!("No API key configured, skipping AI anomaly detection");
            return Ok(Vec::new());
        };

        let request = self.build_request(records)?;

        if let Some(key) = self.config.api_key() {
            info!(
                provider = provider.name(),
                model = %request.model,
                records = records.len(),
                key_prefix = %key_prefix(key),
                timeout = ?self.retry.attempt_timeout,
                "Sending dataset to AI classifier"
            );
        }

        match self.request_content(&**provider, &request).await {
            Ok(Some(content)) => {
                let findings = parse_ai_findings(&content);
                info!(findings = findings.len(), "AI anomaly detection completed");
                Ok(findings)
            }
            Ok(None) => {
                warn!("AI response has no message content");
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    error = %e,
                    max_attempts = self.retry.max_attempts,
                    "AI request retries exhausted, continuing with rule-based findings only"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn request_content(
        &self,
        provider: &dyn ChatProvider,
        request: &ChatRequest,
    ) -> LlmResult<Option<String>> {
        self.retry
            .execute(|attempt| async move {
                debug!(attempt, "AI request attempt");
                let response = provider.complete(request).await?;
                Ok::<_, LlmError>(response.first_content().map(str::to_string))
            })
            .await
    }
}
