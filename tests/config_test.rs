//! 設定ファイルの読み書きテスト

use std::time::Duration;
use tempfile::tempdir;
use xray_ai_common::RevealPolicy;
use xray_ai_rust::config::Config;
use xray_ai_rust::workflow::WorkflowOptions;

/// 設定ファイルがなければデフォルト値
#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.timeout(), Duration::from_secs(120));
    assert_eq!(config.stage_interval(), Duration::from_secs(2));
}

/// 保存した設定を読み戻せる（親フォルダは自動作成）
#[test]
fn test_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("xray-ai").join("config.json");

    let config = Config {
        api_url: Some("http://10.0.0.5:8000".to_string()),
        minimum_display_ms: 0,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.reveal_policy(), RevealPolicy::OnData);
}

/// 一部の項目だけ書かれた設定ファイルは残りをデフォルトで補う
#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "stage_interval_ms": 500 }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.stage_interval(), Duration::from_millis(500));
    assert_eq!(config.timeout_seconds, 120);
    assert!(config.api_url.is_none());

    let options = WorkflowOptions::from_config(&config);
    assert_eq!(options.stage_interval, Duration::from_millis(500));
    assert_eq!(options.reveal, RevealPolicy::MinimumDisplay(Duration::from_secs(12)));
}

/// 壊れた設定ファイルはエラー
#[test]
fn test_invalid_json_is_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ invalid").unwrap();

    assert!(Config::load_from(&path).is_err());
}
