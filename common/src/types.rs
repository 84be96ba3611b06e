//! 解析結果の型定義
//!
//! - DetectionResult: 骨折検出エンドポイントのレスポンス
//! - ReportResult: レポート解析エンドポイントのレスポンス（抽出パラメータ付き）
//! - AnalysisOutcome: フローごとの結果をまとめた列挙型

use serde::{Deserialize, Serialize};

use crate::media::Flow;

/// バウンディングボックス（元画像のピクセル座標）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// 検出1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,

    /// 分類ラベル
    #[serde(rename = "class")]
    pub label: String,

    /// 信頼度 [0, 1]
    pub confidence: f64,

    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// 骨折検出結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub detection_id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    /// 検出枠を描画した画像（ベースURLからの相対パス）
    #[serde(default)]
    pub result_image: Option<String>,

    #[serde(default)]
    pub explanation_image: Option<String>,

    /// Grad-CAM ヒートマップ画像
    #[serde(default)]
    pub gradcam_image: Option<String>,

    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// レポート表から抽出したパラメータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedParameter {
    pub name: String,
    pub value: String,
    pub range: String,
}

/// レポート解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    /// Markdown形式の解説文
    pub analysis: String,

    /// サーバーが抽出した元文書テキスト
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_document: Option<String>,

    /// 解説文中の表から抽出（ベストエフォート）
    #[serde(default)]
    pub parameters: Vec<ExtractedParameter>,
}

/// フローごとの解析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "result", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Detection(DetectionResult),
    Report(ReportResult),
}

impl AnalysisOutcome {
    pub fn flow(&self) -> Flow {
        match self {
            AnalysisOutcome::Detection(_) => Flow::Detection,
            AnalysisOutcome::Report(_) => Flow::Report,
        }
    }

    pub fn as_detection(&self) -> Option<&DetectionResult> {
        match self {
            AnalysisOutcome::Detection(result) => Some(result),
            AnalysisOutcome::Report(_) => None,
        }
    }

    pub fn as_report(&self) -> Option<&ReportResult> {
        match self {
            AnalysisOutcome::Report(result) => Some(result),
            AnalysisOutcome::Detection(_) => None,
        }
    }
}

/// `GET /api/v1/system/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStatus {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_uses_wire_field_names() {
        let json = r#"{"id": 0, "class": "fracture", "confidence": 0.91,
                       "box": {"x1": 1.0, "y1": 2.0, "x2": 3.0, "y2": 4.0}}"#;
        let detection: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(detection.label, "fracture");
        assert_eq!(detection.id, Some(0));
        assert_eq!(detection.bbox.y2, 4.0);

        let value = serde_json::to_value(&detection).unwrap();
        assert_eq!(value["class"], "fracture");
        assert!(value.get("box").is_some());
    }

    #[test]
    fn test_detection_result_missing_fields_default() {
        let result: DetectionResult = serde_json::from_str("{}").unwrap();
        assert!(result.detections.is_empty());
        assert!(result.gradcam_image.is_none());
    }

    #[test]
    fn test_outcome_flow() {
        let outcome = AnalysisOutcome::Report(ReportResult::default());
        assert_eq!(outcome.flow(), Flow::Report);
        assert!(outcome.as_detection().is_none());
        assert!(outcome.as_report().is_some());

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["flow"], "report");
    }
}
