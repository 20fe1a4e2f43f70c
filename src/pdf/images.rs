//! Embedded image extraction via pdfium page objects.
//!
//! Only image objects are visited; vector drawings and text are ignored.
//! Each object is decoded to a `DynamicImage` at its native resolution.
//! An object that fails to decode is logged and skipped; the rest of the
//! page still comes through.

use crate::error::{ItemError, PaperError};
use crate::pdf::{document::open_document, pdfium};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// One decoded image object.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// 1-indexed page number.
    pub page: usize,
    /// 1-indexed position among the page's image objects.
    pub index: usize,
    pub image: DynamicImage,
}

impl EmbeddedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode every embedded image whose width and height are both at least
/// `min_side` pixels.
pub async fn extract_embedded_images(
    pdf_path: &Path,
    min_side: u32,
) -> Result<Vec<EmbeddedImage>, PaperError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_embedded_images_blocking(&path, min_side))
        .await
        .map_err(|e| PaperError::Internal(format!("Image task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_embedded_images`].
pub fn extract_embedded_images_blocking(
    pdf_path: &Path,
    min_side: u32,
) -> Result<Vec<EmbeddedImage>, PaperError> {
    let pdfium = pdfium::bind()?;
    let document = open_document(&pdfium, pdf_path, None)?;

    let mut images = Vec::new();
    let mut skipped_small = 0usize;

    for (page_idx, page) in document.pages().iter().enumerate() {
        let page_num = page_idx + 1;
        let mut index = 0usize;

        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            index += 1;

            let image = match image_object.get_raw_image() {
                Ok(img) => img,
                Err(e) => {
                    let err = ItemError::ImageFailed {
                        page: page_num,
                        index,
                        detail: format!("{:?}", e),
                    };
                    warn!("{}", err);
                    continue;
                }
            };

            if !meets_min_side(&image, min_side) {
                skipped_small += 1;
                continue;
            }

            debug!(
                "Page {} image {}: {}x{}",
                page_num,
                index,
                image.width(),
                image.height()
            );
            images.push(EmbeddedImage {
                page: page_num,
                index,
                image,
            });
        }
    }

    info!(
        "Decoded {} embedded images ({} below {}px skipped)",
        images.len(),
        skipped_small,
        min_side
    );
    Ok(images)
}

pub(crate) fn meets_min_side(image: &DynamicImage, min_side: u32) -> bool {
    image.width() >= min_side && image.height() >= min_side
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn min_side_applies_to_both_dimensions() {
        let wide = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 99, Rgb([0, 0, 0])));
        let square = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
        assert!(!meets_min_side(&wide, 100));
        assert!(meets_min_side(&square, 100));
    }
}
