//! Write a PDF's embedded images to disk and describe them.
//!
//! File names are `image_{page}_{index}_{hash8}.png`, where `hash8` is the
//! first eight hex digits of the PNG's SHA-256. A file that already exists is
//! left untouched and left out of the report, so re-running the export on
//! the same directory only reports new images.

use crate::error::{ItemError, PaperError};
use crate::imaging::{cover, encode, thumbnail};
use crate::pdf::images::extract_embedded_images;
use crate::pdf::EmbeddedImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Images narrower or shorter than this are icons, bullets or rules.
pub const MIN_EXPORT_SIDE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedImage {
    pub filename: String,
    pub path: String,
    pub page: usize,
    pub width: u32,
    pub height: u32,
    /// PNG size in bytes.
    pub size: u64,
    /// Full SHA-256 of the PNG bytes.
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub images: Vec<ExportedImage>,
    pub total: usize,
    pub output_directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<ExportedImage>,
}

/// `<pdf parent>/images`.
pub fn default_output_dir(pdf_path: &Path) -> PathBuf {
    pdf_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("images")
}

/// Extract, save, thumbnail and score the embedded images of `pdf_path`.
pub async fn export_images(
    pdf_path: &Path,
    output_dir: Option<&Path>,
) -> Result<ExtractionReport, PaperError> {
    if !pdf_path.is_file() {
        return Err(PaperError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }
    let out_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_dir(pdf_path));
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| PaperError::io(&out_dir, e))?;

    let embedded = extract_embedded_images(pdf_path, MIN_EXPORT_SIDE).await?;
    let dir = out_dir.clone();
    let mut report = tokio::task::spawn_blocking(move || save_all(&embedded, &dir))
        .await
        .map_err(|e| PaperError::Internal(format!("Export task panicked: {}", e)))?;

    report.cover_image = cover::select_cover(&mut report.images);
    info!(
        "Exported {} images to {}",
        report.total, report.output_directory
    );
    Ok(report)
}

/// Save every image, then sort by size (largest first) and add thumbnails.
pub fn save_all(embedded: &[EmbeddedImage], out_dir: &Path) -> ExtractionReport {
    let mut images: Vec<ExportedImage> = embedded
        .iter()
        .filter_map(|e| match save_one(e, out_dir) {
            Ok(saved) => saved,
            Err(err) => {
                warn!("{}", err);
                None
            }
        })
        .collect();

    images.sort_by(|a, b| b.size.cmp(&a.size));

    for img in images.iter_mut() {
        match thumbnail::create_thumbnail(Path::new(&img.path)) {
            Ok(p) => img.thumbnail = Some(p.display().to_string()),
            Err(err) => warn!("{}", err),
        }
    }

    ExtractionReport {
        total: images.len(),
        images,
        output_directory: out_dir.display().to_string(),
        cover_image: None,
    }
}

/// `Ok(None)` when the target file already exists.
fn save_one(e: &EmbeddedImage, out_dir: &Path) -> Result<Option<ExportedImage>, ItemError> {
    let fail = |detail: String| ItemError::ImageFailed {
        page: e.page,
        index: e.index,
        detail,
    };

    let png = encode::png_bytes(&e.image).map_err(|err| fail(err.to_string()))?;
    let hash = encode::content_hash(&png);
    let filename = format!("image_{}_{}_{}.png", e.page, e.index, &hash[..8]);
    let path = out_dir.join(&filename);
    if path.exists() {
        return Ok(None);
    }
    std::fs::write(&path, &png).map_err(|err| fail(err.to_string()))?;

    Ok(Some(ExportedImage {
        filename,
        path: path.display().to_string(),
        page: e.page,
        width: e.width(),
        height: e.height(),
        size: png.len() as u64,
        hash,
        thumbnail: None,
        quality_score: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn embedded(page: usize, index: usize, w: u32, h: u32, noisy: bool) -> EmbeddedImage {
        let img = RgbImage::from_fn(w, h, |x, y| {
            if noisy {
                Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
            } else {
                Rgb([200, 200, 200])
            }
        });
        EmbeddedImage {
            page,
            index,
            image: DynamicImage::ImageRgb8(img),
        }
    }

    #[test]
    fn default_dir_is_sibling_images_folder() {
        assert_eq!(
            default_output_dir(Path::new("/papers/x/paper.pdf")),
            PathBuf::from("/papers/x/images")
        );
    }

    #[test]
    fn saves_sorted_by_size_with_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![embedded(1, 1, 120, 120, false), embedded(2, 1, 300, 200, true)];

        let report = save_all(&images, dir.path());
        assert_eq!(report.total, 2);
        assert!(report.images[0].size >= report.images[1].size);
        assert_eq!(report.images[0].page, 2);

        for img in &report.images {
            assert!(img.filename.starts_with(&format!("image_{}_1_", img.page)));
            assert!(img.filename.ends_with(&format!("{}.png", &img.hash[..8])));
            assert!(Path::new(&img.path).exists());
            let thumb = img.thumbnail.as_ref().expect("thumbnail");
            assert!(thumb.ends_with(".thumb.jpg"));
        }
    }

    #[test]
    fn existing_files_are_not_reported_again() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![embedded(1, 1, 150, 150, true)];

        assert_eq!(save_all(&images, dir.path()).total, 1);
        let second = save_all(&images, dir.path());
        assert_eq!(second.total, 0);
        assert!(second.images.is_empty());
    }

    #[tokio::test]
    async fn missing_pdf_is_not_found() {
        let err = export_images(Path::new("/no/such/paper.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaperError::FileNotFound { .. }));
    }
}
