use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const LOG_FILE_NAME: &str = "hospital-anomaly.log";

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// ログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル (trace, debug, info, warn, error) またはEnvFilter書式
    pub level: String,
    /// ログディレクトリ
    pub log_dir: PathBuf,
    /// ファイルローテーション設定
    pub rotation: LogRotation,
    /// コンソール（stderr）出力有効
    pub console_enabled: bool,
    /// ファイル出力有効
    pub file_enabled: bool,
    /// JSON形式で出力
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// 日次ローテーション
    #[default]
    Daily,
    /// 時間毎ローテーション
    Hourly,
    /// ローテーションなし
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            rotation: LogRotation::Daily,
            console_enabled: true,
            file_enabled: false,
            json: false,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// カスタムログディレクトリを設定
    pub fn with_log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// コンソール出力制御
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    /// ファイル出力制御
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.file_enabled = enabled;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// 書き込み可能なログディレクトリを決める
/// 優先順位：
/// 1. 設定されたディレクトリ
/// 2. システムテンプディレクトリの hospital-anomaly/logs
fn resolve_log_dir(configured: &Path) -> PathBuf {
    if ensure_log_dir(configured).is_ok() {
        return configured.to_path_buf();
    }

    let temp_log_dir = std::env::temp_dir().join("hospital-anomaly").join("logs");
    if ensure_log_dir(&temp_log_dir).is_ok() {
        return temp_log_dir;
    }

    PathBuf::from(".")
}

/// ログディレクトリを確保
fn ensure_log_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    Ok(())
}

fn file_layer(config: &LogConfig, log_dir: &Path) -> (BoxedLayer, WorkerGuard) {
    let file_appender = match config.rotation {
        LogRotation::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
        LogRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
        LogRotation::Never => rolling::never(log_dir, LOG_FILE_NAME),
    };
    let (writer, guard) = non_blocking(file_appender);

    let layer: BoxedLayer = if config.json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed()
    };

    (layer, guard)
}

fn console_layer(config: &LogConfig) -> BoxedLayer {
    if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_target(true).with_writer(std::io::stderr).boxed()
    }
}

/// ログシステムを初期化
///
/// ファイル出力が有効な場合は非同期ライターのガードを返す。
/// 呼び出し側はプロセス終了まで保持すること（破棄するとファイル出力が止まる）。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;
    let mut log_dir = None;

    if config.console_enabled {
        layers.push(console_layer(config));
    }

    if config.file_enabled {
        let dir = resolve_log_dir(&config.log_dir);
        let (layer, worker_guard) = file_layer(config, &dir);
        layers.push(layer);
        guard = Some(worker_guard);
        log_dir = Some(dir);
    }

    if layers.is_empty() {
        // 最低限の警告出力は残す
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr.with_max_level(tracing::Level::WARN))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        level = %config.level,
        console = config.console_enabled,
        file = config.file_enabled,
        json = config.json,
        log_dir = ?log_dir,
        "Logging initialized"
    );

    Ok(guard)
}
