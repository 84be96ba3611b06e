//! APIレスポンスパーサー
//!
//! HTTPステータスとボディからフローごとの結果型へ変換する。
//! レポート解説文中の `| 項目 | 値 | 基準値 |` 表からのパラメータ抽出も担う。

use serde::Deserialize;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::media::Flow;
use crate::types::{AnalysisOutcome, DetectionResult, ExtractedParameter, ReportResult};

/// フローに応じてレスポンスをデコード
pub fn decode_response(
    flow: Flow,
    status: u16,
    body: &[u8],
) -> std::result::Result<AnalysisOutcome, AnalysisError> {
    match flow {
        Flow::Detection => decode_detection_response(status, body).map(AnalysisOutcome::Detection),
        Flow::Report => decode_report_response(status, body).map(AnalysisOutcome::Report),
    }
}

/// 骨折検出レスポンスをデコード
///
/// 失敗ステータスはステータスコードのみを診断情報として返す。
pub fn decode_detection_response(
    status: u16,
    body: &[u8],
) -> std::result::Result<DetectionResult, AnalysisError> {
    if !is_success(status) {
        return Err(AnalysisError::Status { status, detail: None });
    }

    let result: DetectionResult = serde_json::from_slice(body)
        .map_err(|e| AnalysisError::MalformedResponse(format!("detection JSON: {}", e)))?;

    for (idx, detection) in result.detections.iter().enumerate() {
        if !(0.0..=1.0).contains(&detection.confidence) {
            return Err(AnalysisError::MalformedResponse(format!(
                "detection #{} has confidence {} outside [0, 1]",
                idx + 1,
                detection.confidence
            )));
        }
        let b = &detection.bbox;
        if ![b.x1, b.y1, b.x2, b.y2].iter().all(|v| v.is_finite()) {
            return Err(AnalysisError::MalformedResponse(format!(
                "detection #{} has a non-finite box coordinate",
                idx + 1
            )));
        }
    }

    Ok(result)
}

#[derive(Deserialize)]
struct ReportEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    report: Option<ReportBody>,
    /// `success: false` の場合のみトップレベルに入る
    #[serde(default)]
    analysis: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    analysis: Option<String>,
    #[serde(default)]
    original_document: Option<String>,
}

/// レポート解析レスポンスをデコード
///
/// 失敗ステータスではボディの `detail` をメッセージとして使う。
pub fn decode_report_response(
    status: u16,
    body: &[u8],
) -> std::result::Result<ReportResult, AnalysisError> {
    if !is_success(status) {
        return Err(AnalysisError::Status {
            status,
            detail: extract_detail(body),
        });
    }

    let envelope: ReportEnvelope = serde_json::from_slice(body)
        .map_err(|e| AnalysisError::MalformedResponse(format!("report JSON: {}", e)))?;

    if let Some(ReportBody { analysis: Some(analysis), original_document }) = envelope.report {
        let parameters = extract_parameters(&analysis);
        return Ok(ReportResult {
            analysis,
            original_document,
            parameters,
        });
    }

    match (envelope.success, envelope.analysis) {
        (Some(false), Some(message)) => Err(AnalysisError::Rejected(message)),
        _ => Err(AnalysisError::MalformedResponse(
            "missing report.analysis".to_string(),
        )),
    }
}

/// エラーボディから `detail` を取り出す（文字列以外はJSON表記のまま）
fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// 解説文から3列の表行を抽出
///
/// - `|` で始まり、3セル以上ある行のみ対象（先頭3セルを使用）
/// - 先頭セルに "parameter" を含む行（ヘッダー）と `---` を含む行（区切り）はスキップ
/// - 該当行がなければ空配列（エラーではない）
pub fn extract_parameters(text: &str) -> Vec<ExtractedParameter> {
    text.lines().filter_map(parse_table_row).collect()
}

fn parse_table_row(line: &str) -> Option<ExtractedParameter> {
    let line = line.trim();
    let inner = line.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = inner.split('|').map(str::trim);
    let name = cells.next()?;
    let value = cells.next()?;
    let range = cells.next()?;

    if name.is_empty() || name.to_lowercase().contains("parameter") || name.contains("---") {
        return None;
    }

    Some(ExtractedParameter {
        name: name.to_string(),
        value: value.to_string(),
        range: range.to_string(),
    })
}

/// サーバーが返す相対パスをベースURLで解決
///
/// 既に http(s) の絶対URLならそのまま返す。
pub fn resolve_asset_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
