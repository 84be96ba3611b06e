use crate::error::{Result, XrayAiError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xray_ai_common::RevealPolicy;

/// 開発用サーバーのデフォルトURL
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// APIベースURLを上書きする環境変数
pub const API_URL_ENV: &str = "XRAY_AI_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_seconds: u64,
    /// 疑似進捗ステージの切り替え間隔
    pub stage_interval_ms: u64,
    /// 結果表示までの最低待ち時間（0で即時表示）
    pub minimum_display_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_seconds: 120,
            stage_interval_ms: 2000,
            minimum_display_ms: 12000,  // 5ステージ×2秒 + 2秒
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| XrayAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("xray-ai").join("config.json"))
    }

    /// 有効なAPIベースURL（環境変数 > 設定ファイル > デフォルト）
    pub fn api_url(&self) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        Self::resolve_api_url(env.as_deref(), self.api_url.as_deref())
    }

    fn resolve_api_url(env: Option<&str>, configured: Option<&str>) -> String {
        env.into_iter()
            .chain(configured)
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_url = Some(validate_api_url(&url)?);
        self.save()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn stage_interval(&self) -> Duration {
        Duration::from_millis(self.stage_interval_ms)
    }

    pub fn reveal_policy(&self) -> RevealPolicy {
        if self.minimum_display_ms == 0 {
            RevealPolicy::OnData
        } else {
            RevealPolicy::MinimumDisplay(Duration::from_millis(self.minimum_display_ms))
        }
    }
}

/// http(s) のURLか検証し、末尾の `/` を除いて返す
pub fn validate_api_url(url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| XrayAiError::Config(format!("不正なURL: {} ({})", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(XrayAiError::Config(format!(
            "http/https のURLを指定してください: {}",
            url
        )));
    }
    Ok(url.trim().trim_end_matches('/').to_string())
}
