//! メディアタイプとフロー定義
//!
//! 2つのフロー（骨折検出・レポート解析）はそれぞれ受け付ける
//! メディアタイプと送信先エンドポイントが異なる。

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 受け付け可能なメディアタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Pdf,
}

impl MediaType {
    /// MIME文字列から判定（`image/jpg` も JPEG として扱う）
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    /// 拡張子から判定
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Pdf => "application/pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "JPEG",
            MediaType::Png => "PNG",
            MediaType::Pdf => "PDF",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Png)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// 解析フロー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// X線画像の骨折検出
    Detection,
    /// 医療レポート（血液検査等）の解析
    Report,
}

const DETECTION_TYPES: &[MediaType] = &[MediaType::Jpeg, MediaType::Png];
const REPORT_TYPES: &[MediaType] = &[MediaType::Pdf, MediaType::Png, MediaType::Jpeg];

impl Flow {
    pub fn allowed_media_types(&self) -> &'static [MediaType] {
        match self {
            Flow::Detection => DETECTION_TYPES,
            Flow::Report => REPORT_TYPES,
        }
    }

    pub fn accepts(&self, media_type: MediaType) -> bool {
        self.allowed_media_types().contains(&media_type)
    }

    /// ベースURLに連結するリソースパス
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Flow::Detection => "/api/v1/analysis/detect",
            Flow::Report => "/api/v1/medical-report/analyze",
        }
    }

    /// 許可リストの表示用文字列（例: "JPEG, PNG"）
    pub fn accepted_label(&self) -> String {
        self.allowed_media_types()
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Detection => "detection",
            Flow::Report => "report",
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 検証前のファイル（ドロップまたはファイル選択から得たもの）
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    /// 宣言されたMIMEタイプ。None の場合は拡張子から判定する
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, declared_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.map(str::to_string),
            bytes,
        }
    }

    /// 宣言タイプ（なければ拡張子）からメディアタイプを解決
    pub fn media_type(&self) -> Option<MediaType> {
        match &self.declared_type {
            Some(mime) => MediaType::from_mime(mime),
            None => MediaType::from_path(Path::new(&self.name)),
        }
    }

    /// エラーメッセージ用の宣言タイプ表記
    pub fn declared_label(&self) -> String {
        match &self.declared_type {
            Some(mime) if !mime.is_empty() => mime.clone(),
            _ => Path::new(&self.name)
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// 検証済みのアップロードファイル
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
