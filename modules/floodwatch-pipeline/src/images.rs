//! Image references attached to a report.

use std::path::{Path, PathBuf};

use tracing::warn;

use floodwatch_common::ReportRequest;

/// An image ready to hand to the gatekeeper model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportImage {
    /// Local file read into memory.
    Inline { media_type: String, bytes: Vec<u8> },
    /// Remote image passed by reference.
    Url(String),
}

/// Media type from file extension. `None` for formats the model can't read.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read local images and collect URLs. Unreadable or unsupported files are
/// logged and skipped; the text alone still goes to the gatekeeper.
pub async fn load_images(request: &ReportRequest) -> Vec<ReportImage> {
    let mut images = Vec::with_capacity(request.image_files.len() + request.image_urls.len());

    for file in &request.image_files {
        let path = PathBuf::from(file);
        let Some(media_type) = media_type_for(&path) else {
            warn!(path = file.as_str(), "Skipping image with unsupported extension");
            continue;
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => images.push(ReportImage::Inline {
                media_type: media_type.to_string(),
                bytes,
            }),
            Err(e) => warn!(path = file.as_str(), error = %e, "Failed to read image"),
        }
    }

    images.extend(request.image_urls.iter().cloned().map(ReportImage::Url));
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_types() {
        assert_eq!(media_type_for(Path::new("a/b.JPG")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("flood.webp")), Some("image/webp"));
        assert_eq!(media_type_for(Path::new("notes.txt")), None);
        assert_eq!(media_type_for(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn missing_files_are_skipped_and_urls_kept() {
        let request = ReportRequest::builder()
            .text_input("Banjir")
            .image_files(vec!["/definitely/not/here.png".to_string()])
            .image_urls(vec!["https://example.com/flood.jpg".to_string()])
            .build();

        let images = load_images(&request).await;
        assert_eq!(images, vec![ReportImage::Url("https://example.com/flood.jpg".into())]);
    }

    #[tokio::test]
    async fn readable_files_are_inlined_before_urls() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("river.png");
        std::fs::write(&png, b"\x89PNG").unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"not an image").unwrap();

        let request = ReportRequest::builder()
            .text_input("Banjir")
            .image_files(vec![
                notes.display().to_string(),
                png.display().to_string(),
            ])
            .image_urls(vec!["https://example.com/flood.jpg".to_string()])
            .build();

        let images = load_images(&request).await;
        assert_eq!(
            images,
            vec![
                ReportImage::Inline {
                    media_type: "image/png".into(),
                    bytes: b"\x89PNG".to_vec(),
                },
                ReportImage::Url("https://example.com/flood.jpg".into()),
            ]
        );
    }
}
