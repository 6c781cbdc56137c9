//! チャット補完クライアント

use crate::llm::{
    config::LlmConfig,
    error::{LlmError, LlmResult},
    types::{ChatRequest, ChatResponse},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

/// チャット補完プロバイダートレイト
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// 1回分の補完リクエストを送信
    ///
    /// `choices` が空のレスポンスは `InvalidResponse` として扱う。
    async fn complete(&self, request: &ChatRequest) -> LlmResult<ChatResponse>;

    /// プロバイダー名を取得
    fn name(&self) -> &str;
}

/// HTTP (OpenAI互換) のチャット補完プロバイダー
pub struct HttpChatProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    timeout: Duration,
}

impl HttpChatProvider {
    /// 新しいプロバイダーを作成
    pub fn new(config: &LlmConfig, api_key: SecretString) -> LlmResult<Self> {
        config.validate()?;

        if api_key.expose_secret().is_empty() {
            return Err(LlmError::ConfigError("API key is required".to_string()));
        }

        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            timeout,
        })
    }

    /// エンドポイントURLを取得
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        debug!(
            url = %self.endpoint,
            model = %request.model,
            key_prefix = %key_prefix(&self.api_key),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), body));
        }

        debug!(status = status.as_u16(), bytes = body.len(), "Received chat completion response");

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if parsed.choices.is_empty() {
            return Err(LlmError::InvalidResponse(
                "response contains no choices".to_string(),
            ));
        }

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// ログ出力用のAPIキー接頭辞（先頭8文字 + "..."）
pub fn key_prefix(api_key: &SecretString) -> String {
    let prefix: String = api_key.expose_secret().chars().take(8).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_string().into_boxed_str())
    }

    #[test]
    fn test_provider_creation() {
        let provider = HttpChatProvider::new(&LlmConfig::default(), secret("sk-test-key"));
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_requires_key() {
        let provider = HttpChatProvider::new(&LlmConfig::default(), secret(""));
        assert!(matches!(provider, Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_key_prefix_hides_secret() {
        assert_eq!(key_prefix(&secret("sk-1234567890abcdef")), "sk-12345...");
        assert_eq!(key_prefix(&secret("abc")), "abc...");
    }
}
