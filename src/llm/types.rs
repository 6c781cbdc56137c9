//! チャット補完APIの型定義

use serde::{Deserialize, Serialize};

/// メッセージのロール
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// システムメッセージ
    System,
    /// ユーザーメッセージ
    User,
    /// アシスタント（AI）メッセージ
    Assistant,
}

/// チャットメッセージ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// メッセージのロール
    pub role: Role,
    /// メッセージ内容
    pub content: String,
}

impl Message {
    /// 新しいシステムメッセージを作成
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// 新しいユーザーメッセージを作成
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// チャット補完リクエスト
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// 使用するモデル
    pub model: String,
    /// メッセージ履歴
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// システムプロンプトとユーザープロンプトからリクエストを作成
    pub fn with_system(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
        }
    }
}

/// チャット補完レスポンス
///
/// `choices` が欠けている・配列でない場合はデシリアライズ自体が失敗する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// 先頭の選択肢のテキスト（存在すれば）
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }
}

/// 補完の選択肢
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

/// 選択肢のメッセージ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
