use thiserror::Error;

#[derive(Error, Debug)]
pub enum XrayAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("対象ファイルが見つかりません: {0}")]
    NoFilesFound(String),

    #[error("HTTP通信エラー: {0}")]
    Http(String),

    #[error("プレビュー生成エラー: {0}")]
    Preview(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] xray_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, XrayAiError>;
