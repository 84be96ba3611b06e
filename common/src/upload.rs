//! アップロード面（ドラッグ&ドロップ / ファイル選択）
//!
//! ドラッグ状態は表示用のみで、検証結果には影響しない。

use crate::error::{Error, Result};
use crate::media::{FileCandidate, Flow, UploadedFile};

#[derive(Debug, Clone)]
pub struct UploadSurface {
    flow: Flow,
    is_dragging: bool,
}

impl UploadSurface {
    pub fn new(flow: Flow) -> Self {
        Self { flow, is_dragging: false }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn drag_enter(&mut self) {
        self.is_dragging = true;
    }

    pub fn drag_over(&mut self) {}

    pub fn drag_leave(&mut self) {
        self.is_dragging = false;
    }

    /// ドロップされたファイルのうち先頭のみ受け付ける。空のドロップは無視（None）
    pub fn drop_files(&mut self, files: Vec<FileCandidate>) -> Option<Result<UploadedFile>> {
        self.is_dragging = false;
        files.into_iter().next().map(|file| self.validate(file))
    }

    /// ファイル選択ダイアログから
    pub fn pick(&self, file: FileCandidate) -> Result<UploadedFile> {
        self.validate(file)
    }

    fn validate(&self, file: FileCandidate) -> Result<UploadedFile> {
        match file.media_type() {
            Some(media_type) if self.flow.accepts(media_type) => Ok(UploadedFile {
                name: file.name,
                media_type,
                bytes: file.bytes,
            }),
            _ => Err(Error::UnsupportedMediaType {
                media_type: file.declared_label(),
                file_name: file.name,
                accepted: self.flow.accepted_label(),
            }),
        }
    }
}
