//! 解析結果の保存
//!
//! - JSON: 結果と付帯情報（解析日時・API URL）
//! - 画像: 検出結果画像・説明画像・Grad-CAM をダウンロード

use crate::api::HttpApi;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use xray_ai_common::{AnalysisOutcome, DetectionResult, Flow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysis {
    pub flow: Flow,
    pub file_name: String,
    pub api_url: String,
    /// RFC 3339
    pub analyzed_at: String,
    pub outcome: AnalysisOutcome,
}

impl SavedAnalysis {
    pub fn new(file_name: &str, api_url: &str, outcome: AnalysisOutcome) -> Self {
        Self {
            flow: outcome.flow(),
            file_name: file_name.to_string(),
            api_url: api_url.to_string(),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
            outcome,
        }
    }
}

/// 結果をJSON配列として保存（バッチ時も1ファイル）
pub fn save_json(path: &Path, results: &[SavedAnalysis]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Vec<SavedAnalysis>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// 検出結果に含まれる画像パス（ラベル, パス）
pub fn asset_paths(result: &DetectionResult) -> Vec<(&'static str, &str)> {
    [
        ("result", result.result_image.as_deref()),
        ("explanation", result.explanation_image.as_deref()),
        ("gradcam", result.gradcam_image.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, path)| path.filter(|p| !p.is_empty()).map(|p| (label, p)))
    .collect()
}

/// 出力先ファイル名: `<元ファイル名の拡張子なし>_<ラベル>.<拡張子>`
pub fn asset_file_name(source_name: &str, label: &str, asset_path: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let ext = Path::new(asset_path)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "jpg".to_string());
    format!("{}_{}.{}", stem, label, ext)
}

/// 画像をダウンロードして保存。個別の失敗は警告のみで続行
pub async fn download_assets(
    api: &HttpApi,
    result: &DetectionResult,
    source_name: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut saved = Vec::new();
    for (label, path) in asset_paths(result) {
        match api.fetch_asset(path).await {
            Ok(bytes) => {
                let dest = output_dir.join(asset_file_name(source_name, label, path));
                std::fs::write(&dest, bytes)?;
                saved.push(dest);
            }
            Err(e) => warn!(asset = path, error = %e, "asset download failed"),
        }
    }
    Ok(saved)
}
