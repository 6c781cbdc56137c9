//! Application configuration
//!
//! 解析・プロバイダー・ルール・ログの設定をまとめて扱う。

mod loader;

pub use loader::ConfigLoader;

use crate::analysis::{AnalysisConfig, RuleFlag, RuleSet};
use crate::llm::LlmConfig;
use crate::logging::{LogConfig, LogRotation};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// アプリケーション全体の設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rules: RuleSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// ルールの有効/無効の上書き（既定ルールに位置で対応）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default)]
    pub single: Option<Vec<RuleFlag>>,
    #[serde(default)]
    pub cross: Option<Vec<RuleFlag>>,
}

impl RuleSettings {
    /// 上書きを適用した新しいルールセット
    pub fn apply(&self, base: &RuleSet) -> RuleSet {
        base.with_flags(self.single.as_deref(), self.cross.as_deref())
    }
}

/// ログ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
    /// 未指定なら既定のログディレクトリ
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub rotation: LogRotation,
    #[serde(default = "default_true")]
    pub console: bool,
    #[serde(default)]
    pub file: bool,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
            rotation: LogRotation::default(),
            console: true,
            file: false,
            json: false,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        let mut config = LogConfig::default()
            .with_level(&self.level)
            .with_rotation(self.rotation)
            .with_console(self.console)
            .with_file(self.file)
            .with_json(self.json);

        if let Some(dir) = &self.log_dir {
            config = config.with_log_dir(dir);
        }

        config
    }
}

impl AppConfig {
    /// 設定済みの上書きを既定ルールに適用したルールセット
    pub fn rule_set(&self) -> RuleSet {
        self.rules.apply(&RuleSet::defaults())
    }

    /// 設定値の検証
    pub fn validate(&self) -> Result<()> {
        self.llm.validate().context("Invalid [llm] section")?;
        Ok(())
    }

    /// サンプル設定ファイルの内容
    pub fn sample_toml() -> Result<String> {
        let sample = AppConfig {
            analysis: AnalysisConfig {
                system_prompt: "You are an auditor of hospital financial and operational \
                    indicators. Reply with a JSON array of anomalies, each with hospitalName, \
                    date, indicator, value and description."
                    .to_string(),
                ..AnalysisConfig::default()
            },
            llm: LlmConfig::default(),
            rules: RuleSettings {
                single: Some(vec![RuleFlag { enabled: true }]),
                cross: Some(vec![RuleFlag { enabled: true }, RuleFlag { enabled: true }]),
            },
            logging: LoggingSettings::default(),
        };

        let body = toml::to_string_pretty(&sample).context("Failed to render sample config")?;

        Ok(format!(
            r#"# hospital-anomaly configuration
#
# hospital-anomaly.toml または config/hospital-anomaly.toml として保存してください。
# 環境変数での上書きも可能です (例: HOSPITAL_ANOMALY__LLM__MODEL=deepseek-r1-250120)
#
# APIキーはファイルに書かず環境変数で渡してください:
#   HOSPITAL_ANOMALY__ANALYSIS__API_KEY=...
# 未設定の場合、AI検出は行われずルールベースの結果のみになります。
#
# [[rules.single]] / [[rules.cross]] は既定ルールに順番で対応します。
# リストを書いた場合、対応する要素のないルールは無効になります。

{}"#,
            body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_set() {
        let config = AppConfig::default();
        let rules = config.rule_set();
        assert_eq!(rules.enabled_single().count(), 1);
        assert_eq!(rules.enabled_cross().count(), 2);
    }

    #[test]
    fn test_rule_settings_short_list_disables_rest() {
        let settings = RuleSettings {
            single: None,
            cross: Some(vec![RuleFlag { enabled: true }]),
        };
        let rules = settings.apply(&RuleSet::defaults());
        assert!(rules.cross[0].enabled);
        assert!(!rules.cross[1].enabled);
        assert!(rules.single[0].enabled);
    }

    #[test]
    fn test_sample_toml_parses_back() {
        let sample = AppConfig::sample_toml().unwrap();
        assert!(sample.contains("[llm]"));
        assert!(sample.contains("[[rules.cross]]"));

        let parsed: AppConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.llm, LlmConfig::default());
        assert_eq!(parsed.rules.cross.map(|c| c.len()), Some(2));
        assert!(parsed.analysis.api_key.is_none());
    }

    #[test]
    fn test_logging_settings_to_log_config() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            log_dir: Some(PathBuf::from("/tmp/hospital-anomaly")),
            rotation: LogRotation::Hourly,
            console: false,
            file: true,
            json: true,
        };
        let config = settings.to_log_config();
        assert_eq!(config.level, "debug");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/hospital-anomaly"));
        assert!(config.file_enabled);
        assert!(!config.console_enabled);
        assert!(config.json);
    }
}
