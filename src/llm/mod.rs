//! LLM統合
//!
//! 外部のチャット補完サービス（OpenAI互換API）との通信を提供します。
//! 異常検知エンジンはこれを不透明なリモート呼び出しとして扱います。

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{key_prefix, ChatProvider, HttpChatProvider};
pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
pub use retry::RetryPolicy;
pub use types::{ChatRequest, ChatResponse, Choice, ChoiceMessage, Message, Role};
