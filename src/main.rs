//! hospital-anomaly CLI
//!
//! データセットファイルを読み込んで異常解析を行い、結果を標準出力に書く。

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use hospital_anomaly::analysis::{filter::parse_date, load_dataset};
use hospital_anomaly::logging::init_logging;
use hospital_anomaly::{
    partition_by_hospital, AnomalyAnalyzer, AppConfig, ConfigLoader, FindingFilter, FindingKind,
    MetricRecord,
};
use std::path::PathBuf;
use tracing::info;

/// Hospital metrics anomaly analyzer
#[derive(Parser)]
#[command(name = "hospital-anomaly")]
#[command(about = "Rule-based and AI-assisted anomaly detection for hospital metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HOSPITAL_ANOMALY_CONFIG", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more dataset files (JSON arrays of records)
    Analyze {
        /// Dataset files; each file is one dataset unless --split-by-hospital is set
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Merge all files and analyze each hospital as its own dataset
        #[arg(long)]
        split_by_hospital: bool,

        /// Only report findings of this kind (single, cross, ai)
        #[arg(long)]
        kind: Option<FindingKind>,

        /// Only report findings dated on or after this date
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,

        /// Only report findings dated on or before this date
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print a sample configuration file
    SampleConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).ok_or_else(|| {
        format!(
            "invalid date '{}': expected YYYY-MM-DD, YYYY-MM or YYYY/MM/DD",
            value
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::SampleConfig => {
            print!("{}", AppConfig::sample_toml()?);
            Ok(())
        }
        Commands::Analyze {
            files,
            split_by_hospital,
            kind,
            from,
            to,
            format,
        } => {
            let config = ConfigLoader::new()
                .load_from_file(cli.config.as_deref())
                .load_from_env()
                .build()?;
            let _guard = init_logging(&config.logging.to_log_config())?;

            let datasets = load_datasets(&files, split_by_hospital)?;
            let analyzer =
                AnomalyAnalyzer::new(config.analysis.clone(), &config.llm, config.rule_set())?;

            info!(
                datasets = datasets.len(),
                ai_enabled = analyzer.detector().is_enabled(),
                "Starting analysis"
            );
            let findings = analyzer.analyze_datasets(&datasets).await;

            let mut filter = FindingFilter::new().with_range(from, to);
            filter.kind = kind;
            let selected = filter.apply(&findings);

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&selected)?);
                }
                OutputFormat::Text => {
                    for finding in &selected {
                        println!(
                            "[{}] {} {} {}",
                            finding.kind().as_str(),
                            finding.hospital(),
                            finding.date(),
                            finding
                        );
                    }
                }
            }

            Ok(())
        }
    }
}

fn load_datasets(files: &[PathBuf], split_by_hospital: bool) -> Result<Vec<Vec<MetricRecord>>> {
    let mut datasets = Vec::with_capacity(files.len());
    for path in files {
        let records = load_dataset(path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        datasets.push(records);
    }

    if split_by_hospital {
        Ok(partition_by_hospital(datasets.into_iter().flatten().collect()))
    } else {
        Ok(datasets)
    }
}
