//! 解析結果の表示モデル
//!
//! レスポンスを表示用の構造に変換し、`Display` で端末向けテキストを出力する。

use serde::Serialize;
use std::fmt;

use crate::markdown::render_markdown;
use crate::parser::resolve_asset_url;
use crate::types::{Detection, DetectionResult, ExtractedParameter, ReportResult};

const BAR_WIDTH: usize = 20;

/// 信頼度の段階（丸めたパーセント値で判定、境界値は上位段階に含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// 80%以上
    High,
    /// 50%以上80%未満
    Medium,
    /// 50%未満
    Low,
}

impl ConfidenceTier {
    pub fn from_percent(percent: u32) -> Self {
        if percent >= 80 {
            ConfidenceTier::High
        } else if percent >= 50 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn from_confidence(confidence: f64) -> Self {
        Self::from_percent(confidence_percent(confidence))
    }

    pub fn color(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "green",
            ConfidenceTier::Medium => "yellow",
            ConfidenceTier::Low => "red",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "HIGH",
            ConfidenceTier::Medium => "MEDIUM",
            ConfidenceTier::Low => "LOW",
        }
    }
}

/// 信頼度 [0,1] を 0〜100 の整数パーセントへ
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// 検出カード1枚分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionCard {
    pub title: String,
    pub confidence_percent: u32,
    pub tier: ConfidenceTier,
    /// 例: "x: 10-110, y: 21-220"
    pub location: String,
}

impl DetectionCard {
    pub fn new(index: usize, detection: &Detection) -> Self {
        let percent = confidence_percent(detection.confidence);
        let b = &detection.bbox;
        Self {
            title: format!("{} #{}", detection.label, index + 1),
            confidence_percent: percent,
            tier: ConfidenceTier::from_percent(percent),
            location: format!(
                "x: {}-{}, y: {}-{}",
                b.x1.round() as i64,
                b.x2.round() as i64,
                b.y1.round() as i64,
                b.y2.round() as i64
            ),
        }
    }

    pub fn bar(&self) -> String {
        let filled = (self.confidence_percent as usize * BAR_WIDTH + 50) / 100;
        let filled = filled.min(BAR_WIDTH);
        format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
    }
}

/// 検出結果の一覧。検出なしは空リストではなく専用の状態で表す
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "cards", rename_all = "snake_case")]
pub enum Findings {
    NoFractures,
    Cards(Vec<DetectionCard>),
}

/// ヒートマップ凡例（固定。実際の画素値とは無関係）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub color: &'static str,
    pub label: &'static str,
}

pub const HEATMAP_LEGEND: [LegendEntry; 3] = [
    LegendEntry { color: "red", label: "High Attention" },
    LegendEntry { color: "yellow", label: "Medium Attention" },
    LegendEntry { color: "green", label: "Low Attention" },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSection {
    pub image_url: String,
    pub legend: [LegendEntry; 3],
}

/// 骨折検出結果の表示モデル
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionView {
    /// 元画像の表示名
    pub original: String,
    pub overlay_url: Option<String>,
    pub explanation_url: Option<String>,
    pub findings: Findings,
    pub heatmap: Option<HeatmapSection>,
}

impl DetectionView {
    pub fn build(result: &DetectionResult, base_url: &str, original: &str) -> Self {
        let resolve = |path: &Option<String>| {
            path.as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| resolve_asset_url(base_url, p))
        };

        let findings = if result.detections.is_empty() {
            Findings::NoFractures
        } else {
            Findings::Cards(
                result
                    .detections
                    .iter()
                    .enumerate()
                    .map(|(i, d)| DetectionCard::new(i, d))
                    .collect(),
            )
        };

        Self {
            original: original.to_string(),
            overlay_url: resolve(&result.result_image),
            explanation_url: resolve(&result.explanation_image),
            findings,
            heatmap: resolve(&result.gradcam_image).map(|image_url| HeatmapSection {
                image_url,
                legend: HEATMAP_LEGEND,
            }),
        }
    }
}

impl fmt::Display for DetectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detection Results")?;
        writeln!(f, "═════════════════")?;
        writeln!(f, "  Original Image:   {}", self.original)?;
        match &self.overlay_url {
            Some(url) => writeln!(f, "  Detection Result: {}", url)?,
            None => writeln!(f, "  Detection Result: No result image available")?,
        }
        if let Some(url) = &self.explanation_url {
            writeln!(f, "  Explanation:      {}", url)?;
        }

        writeln!(f)?;
        writeln!(f, "Fracture Analysis")?;
        writeln!(f, "─────────────────")?;
        match &self.findings {
            Findings::NoFractures => {
                writeln!(f, "  No fractures detected")?;
                writeln!(f, "  The AI did not detect any fractures in this image.")?;
            }
            Findings::Cards(cards) => {
                for card in cards {
                    writeln!(f, "  {}", card.title)?;
                    writeln!(
                        f,
                        "    Confidence: {} {:>3}% [{}]",
                        card.bar(),
                        card.confidence_percent,
                        card.tier.label()
                    )?;
                    writeln!(f, "    Location:   {}", card.location)?;
                }
            }
        }

        if let Some(heatmap) = &self.heatmap {
            writeln!(f)?;
            writeln!(f, "Grad-CAM Visualization")?;
            writeln!(f, "──────────────────────")?;
            writeln!(
                f,
                "  This heat map highlights areas that influenced the AI's fracture detection decision"
            )?;
            writeln!(f, "  {}", heatmap.image_url)?;
            let legend: Vec<String> = heatmap
                .legend
                .iter()
                .map(|e| format!("{} = {}", e.color, e.label))
                .collect();
            writeln!(f, "  Legend: {}", legend.join(", "))?;
        }

        Ok(())
    }
}

/// レポート解析結果の表示モデル
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub parameters: Vec<ExtractedParameter>,
    /// 端末向けに整形済みの解説文
    pub narrative: String,
}

impl ReportView {
    pub fn build(result: &ReportResult) -> Self {
        Self {
            parameters: result.parameters.clone(),
            narrative: render_markdown(&result.analysis),
        }
    }
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.parameters.is_empty() {
            writeln!(f, "Key Metrics")?;
            writeln!(f, "═══════════")?;
            for param in &self.parameters {
                writeln!(f, "  ▌ {}", param.name.to_uppercase())?;
                writeln!(f, "  ▌ {:<24} Ref: {}", param.value, param.range)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Detailed Analysis")?;
        writeln!(f, "═════════════════")?;
        writeln!(f, "{}", self.narrative)
    }
}
