//! 設定読み込みのテスト

use hospital_anomaly::{AppConfig, ConfigLoader};
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("hospital-anomaly.toml");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_defaults_without_file() {
    let config = ConfigLoader::new().build().unwrap();

    assert!(!config.analysis.ai_enabled());
    assert!(config.analysis.timeseries_analysis);
    assert_eq!(config.llm.max_attempts, 3);
    assert_eq!(config.llm.timeout_secs, 60);
    assert_eq!(config.rule_set().enabled_cross().count(), 2);
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[analysis]
api_key = "sk-file-key"
system_prompt = "Find anomalies."
timeseries_analysis = false

[llm]
endpoint = "http://127.0.0.1:8080/v1/chat/completions"
model = "local-model"
retry_backoff_ms = 250

[[rules.cross]]
enabled = false

[[rules.cross]]
enabled = true

[logging]
level = "debug"
rotation = "hourly"
"#,
    );

    let config = ConfigLoader::new().load_from_file(Some(&path)).build().unwrap();

    assert!(config.analysis.ai_enabled());
    assert!(!config.analysis.timeseries_analysis);
    assert_eq!(config.analysis.system_prompt, "Find anomalies.");
    assert_eq!(config.llm.model, "local-model");
    assert_eq!(config.llm.retry_backoff_ms, 250);
    // 未指定の値は既定値
    assert_eq!(config.llm.max_attempts, 3);
    assert_eq!(config.logging.level, "debug");

    let rules = config.rule_set();
    assert!(rules.single[0].enabled);
    assert!(!rules.cross[0].enabled);
    assert!(rules.cross[1].enabled);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    let result = ConfigLoader::new()
        .load_from_file(Some(&path.to_string_lossy()))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_invalid_llm_section_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[llm]\nmax_attempts = 0\n");

    let err = ConfigLoader::new()
        .load_from_file(Some(&path))
        .build()
        .unwrap_err();
    assert!(format!("{:#}", err).contains("llm"));
}

#[test]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[llm]\nmodel = \"from-file\"\n");

    std::env::set_var("HOSPITAL_ANOMALY__LLM__MODEL", "from-env");
    std::env::set_var("HOSPITAL_ANOMALY__ANALYSIS__API_KEY", "sk-env-key");

    let config = ConfigLoader::new()
        .load_from_file(Some(&path))
        .load_from_env()
        .build();

    std::env::remove_var("HOSPITAL_ANOMALY__LLM__MODEL");
    std::env::remove_var("HOSPITAL_ANOMALY__ANALYSIS__API_KEY");

    let config = config.unwrap();
    assert_eq!(config.llm.model, "from-env");
    assert!(config.analysis.ai_enabled());
}

#[test]
fn test_sample_config_round_trips_through_loader() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &AppConfig::sample_toml().unwrap());

    let config = ConfigLoader::new().load_from_file(Some(&path)).build().unwrap();
    assert!(!config.analysis.system_prompt.is_empty());
    assert_eq!(config.rule_set().enabled_single().count(), 1);
}
