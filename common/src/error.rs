//! エラー型定義

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::{WorkflowAction, WorkflowState};

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported file type for {file_name}: {media_type} (accepted: {accepted})")]
    UnsupportedMediaType {
        file_name: String,
        media_type: String,
        accepted: String,
    },

    #[error("Cannot {action} while workflow is {state}")]
    InvalidTransition {
        state: WorkflowState,
        action: WorkflowAction,
    },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// 解析送信の失敗理由
///
/// `Failed` 状態に保持されるため Clone/Serialize 可能にしている。
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AnalysisError {
    /// レスポンスが得られなかった（接続失敗・タイムアウト）
    #[error("Network error: {0}")]
    Transport(String),

    /// 非2xxのHTTPステータス
    #[error("{}", status_message(.status, .detail))]
    Status { status: u16, detail: Option<String> },

    /// サーバーが医療レポートとして受け付けなかった
    #[error("Document was not accepted: {0}")]
    Rejected(String),

    /// 想定外のレスポンス形式
    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.trim().is_empty() => detail.clone(),
        _ => format!("HTTP error! Status: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_unsupported_media_type_display() {
        let error = Error::UnsupportedMediaType {
            file_name: "scan.gif".to_string(),
            media_type: "image/gif".to_string(),
            accepted: "JPEG, PNG".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("scan.gif"));
        assert!(display.contains("image/gif"));
        assert!(display.contains("JPEG, PNG"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = Error::InvalidTransition {
            state: WorkflowState::Submitting,
            action: WorkflowAction::Submit,
        };
        assert_eq!(format!("{}", error), "Cannot submit while workflow is submitting");
    }

    #[test]
    fn test_status_without_detail_uses_status_code() {
        let error = AnalysisError::Status { status: 500, detail: None };
        assert_eq!(error.to_string(), "HTTP error! Status: 500");
    }

    #[test]
    fn test_status_with_detail_prefers_server_message() {
        let error = AnalysisError::Status {
            status: 400,
            detail: Some("No readable text found in the document".to_string()),
        };
        assert_eq!(error.to_string(), "No readable text found in the document");
    }

    #[test]
    fn test_blank_detail_falls_back_to_status() {
        let error = AnalysisError::Status { status: 502, detail: Some("  ".to_string()) };
        assert_eq!(error.to_string(), "HTTP error! Status: 502");
    }

    #[test]
    fn test_analysis_error_serializes_with_kind() {
        let error = AnalysisError::Transport("connection refused".to_string());
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "transport");
    }
}
