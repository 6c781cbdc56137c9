//! LLM統合のエラー型定義

use std::time::Duration;
use thiserror::Error;

/// LLM呼び出しのエラー型
///
/// 分類はログ出力用であり、リトライ可否の判定には使わない
/// （すべての失敗は同じリトライ方針に従う）。
#[derive(Error, Debug)]
pub enum LlmError {
    /// 認証エラー (401/403)
    #[error("Authentication error ({status}): {body}")]
    AuthError { status: u16, body: String },

    /// レート制限エラー (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// サーバーエラー (5xx)
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// その他の非成功ステータス
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// レスポンス構造が不正
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// ネットワークエラー
    #[error("Network error: {0}")]
    NetworkError(String),

    /// タイムアウト
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSONエラー
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// その他のエラー
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LlmError {
    /// HTTPステータスからエラーを分類
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => LlmError::AuthError { status, body },
            429 => LlmError::RateLimitError(body),
            500..=599 => LlmError::ServerError { status, body },
            _ => LlmError::ApiError { status, body },
        }
    }

    /// ログ用の短い分類ラベル
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::AuthError { .. } => "auth",
            LlmError::RateLimitError(_) => "rate_limit",
            LlmError::ServerError { .. } => "server",
            LlmError::ApiError { .. } => "api",
            LlmError::InvalidResponse(_) | LlmError::JsonError(_) => "malformed_response",
            LlmError::NetworkError(_) => "network",
            LlmError::Timeout(_) => "timeout",
            LlmError::ConfigError(_) => "config",
            LlmError::Internal(_) => "internal",
        }
    }
}

impl LlmError {
    /// トランスポートエラーを分類し、タイムアウトには設定された上限を付ける
    pub fn from_transport(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(limit)
        } else {
            err.into()
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::NetworkError(err.to_string())
        }
    }
}

/// LLM統合の結果型
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(LlmError::from_status(401, "").kind(), "auth");
        assert_eq!(LlmError::from_status(403, "").kind(), "auth");
        assert_eq!(LlmError::from_status(429, "slow down").kind(), "rate_limit");
        assert_eq!(LlmError::from_status(502, "").kind(), "server");
        assert_eq!(LlmError::from_status(404, "").kind(), "api");
    }

    #[test]
    fn test_malformed_kind() {
        let err = LlmError::InvalidResponse("choices is empty".to_string());
        assert_eq!(err.kind(), "malformed_response");
    }
}
