use super::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};

const ENV_PREFIX: &str = "HOSPITAL_ANOMALY";

/// Configuration loader with builder pattern
///
/// 優先順位: 既定値 < 設定ファイル < 環境変数
pub struct ConfigLoader {
    config_file: Option<String>,
    load_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_file: None,
            load_env: false,
        }
    }

    /// 設定ファイルを指定（`None` なら標準の場所を探す）
    pub fn load_from_file(mut self, path: Option<&str>) -> Self {
        self.config_file = path.map(String::from);
        self
    }

    /// `HOSPITAL_ANOMALY__SECTION__KEY` 形式の環境変数を読む
    pub fn load_from_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(config_path) = &self.config_file {
            builder = builder.add_source(File::with_name(config_path).required(true));
        } else {
            builder = builder
                .add_source(File::with_name("hospital-anomaly").required(false))
                .add_source(File::with_name("config/hospital-anomaly").required(false));
        }

        if self.load_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            );
        }

        let config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
