//! Image encoding: `DynamicImage` → PNG bytes, content hash, and base64
//! `ImageData` for vision requests.
//!
//! PNG keeps extracted figures lossless, so the bytes written to disk, the
//! bytes hashed for the file name and the bytes sent to the vision model
//! are the same.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG.
pub fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Wrap PNG bytes as a base64 attachment for a vision model.
pub fn image_data(png: &[u8]) -> ImageData {
    let b64 = STANDARD.encode(png);
    debug!("Encoded image → {} bytes base64", b64.len());
    ImageData::new(b64, "image/png").with_detail("high")
}
