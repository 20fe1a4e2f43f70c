//! Thumbnails for extracted images.

use crate::error::ItemError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const THUMBNAIL_SIZE: u32 = 150;
pub const JPEG_QUALITY: u8 = 85;

/// `image_1_2_ab12cd34.png` → `image_1_2_ab12cd34.thumb.jpg`.
pub fn thumbnail_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("thumb.jpg")
}

/// Write a JPEG preview that fits within 150×150 next to `image_path`.
///
/// Images already smaller than the box are not enlarged.
pub fn create_thumbnail(image_path: &Path) -> Result<PathBuf, ItemError> {
    let fail = |detail: String| ItemError::ThumbnailFailed {
        filename: image_path.display().to_string(),
        detail,
    };

    let img = image::open(image_path).map_err(|e| fail(e.to_string()))?;
    let thumb = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    let out = thumbnail_path(image_path);
    let file = File::create(&out).map_err(|e| fail(e.to_string()))?;
    let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
    // JPEG has no alpha channel.
    encoder
        .encode_image(&thumb.to_rgb8())
        .map_err(|e| fail(e.to_string()))?;
    Ok(out)
}
