use crate::error::{Result, XrayAiError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xray_ai_common::{Flow, MediaType};

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub media_type: MediaType,
}

/// フォルダ内の、フローが受け付けるファイルを列挙する
pub fn scan_folder(folder: &Path, flow: Flow, recursive: bool) -> Result<Vec<ScannedFile>> {
    if !folder.is_dir() {
        return Err(XrayAiError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(media_type) = MediaType::from_path(path) else {
            continue;
        };
        if !flow.accepts(media_type) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        files.push(ScannedFile {
            path: path.to_path_buf(),
            file_name,
            media_type,
        });
    }

    // パス順（再帰時はサブフォルダごとにまとまる）
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(files)
}
