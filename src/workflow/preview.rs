//! ローカルプレビュー（Data URL）の生成

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageReader;
use serde::Serialize;
use std::io::Cursor;
use xray_ai_common::UploadedFile;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewHandle {
    /// "data:image/jpeg;base64,/9j/4AAQ..." 形式
    pub data_url: String,
    /// 画像として読めた場合のみ (幅, 高さ)
    pub dimensions: Option<(u32, u32)>,
}

impl PreviewHandle {
    pub fn derive(file: &UploadedFile) -> Self {
        let data_url = format!(
            "data:{};base64,{}",
            file.media_type.as_mime(),
            STANDARD.encode(&file.bytes)
        );

        let dimensions = if file.media_type.is_image() {
            image_dimensions(&file.bytes)
        } else {
            None
        };

        Self { data_url, dimensions }
    }
}

fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use xray_ai_common::MediaType;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_data_url_prefix() {
        let file = UploadedFile {
            name: "labs.pdf".to_string(),
            media_type: MediaType::Pdf,
            bytes: b"%PDF-1.4".to_vec(),
        };
        let preview = PreviewHandle::derive(&file);
        assert_eq!(preview.data_url, "data:application/pdf;base64,JVBERi0xLjQ=");
        assert!(preview.dimensions.is_none());
    }

    #[test]
    fn test_png_dimensions() {
        let file = UploadedFile {
            name: "hand.png".to_string(),
            media_type: MediaType::Png,
            bytes: png_bytes(4, 3),
        };
        let preview = PreviewHandle::derive(&file);
        assert!(preview.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(preview.dimensions, Some((4, 3)));
    }

    #[test]
    fn test_undecodable_image_has_no_dimensions() {
        let file = UploadedFile {
            name: "broken.jpg".to_string(),
            media_type: MediaType::Jpeg,
            bytes: vec![1, 2, 3],
        };
        assert!(PreviewHandle::derive(&file).dimensions.is_none());
    }
}
