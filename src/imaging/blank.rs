//! Blank and logo detection for cover candidates.
//!
//! A candidate is rejected when it is too small to be a cover (usually a
//! publisher logo), when its grayscale variance is tiny (a flat fill), or
//! when almost every pixel is near-white (an empty scan).

use image::DynamicImage;
use std::fmt;
use std::path::Path;

/// Grayscale level above which a pixel counts as white.
const WHITE_LEVEL: u8 = 240;

/// Variance below which an image is considered uniform.
const MIN_VARIANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlankThresholds {
    /// White-pixel ratio above which the image is blank. Default: 0.95.
    pub white_ratio: f64,
    /// Minimum cover width in pixels. Default: 400.
    pub min_width: u32,
    /// Minimum cover height in pixels. Default: 300.
    pub min_height: u32,
}

impl Default for BlankThresholds {
    fn default() -> Self {
        Self {
            white_ratio: 0.95,
            min_width: 400,
            min_height: 300,
        }
    }
}

/// Outcome of a blank check.
///
/// `Display` renders the single status line the `check-blank-image` tool
/// prints, e.g. `SMALL_LOGO:120x80` or `OK:800x600:1532.4:0.41`.
#[derive(Debug, Clone, PartialEq)]
pub enum BlankVerdict {
    SmallLogo { width: u32, height: u32 },
    LowVariance { variance: f64 },
    MostlyWhite { white_ratio: f64 },
    Content {
        width: u32,
        height: u32,
        variance: f64,
        white_ratio: f64,
    },
    /// The image could not be read. Not treated as blank.
    Error(String),
}

impl BlankVerdict {
    pub fn is_blank(&self) -> bool {
        matches!(
            self,
            BlankVerdict::SmallLogo { .. }
                | BlankVerdict::LowVariance { .. }
                | BlankVerdict::MostlyWhite { .. }
        )
    }
}

impl fmt::Display for BlankVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlankVerdict::SmallLogo { width, height } => write!(f, "SMALL_LOGO:{width}x{height}"),
            BlankVerdict::LowVariance { variance } => write!(f, "BLANK:{variance}"),
            BlankVerdict::MostlyWhite { white_ratio } => write!(f, "BLANK:{white_ratio}"),
            BlankVerdict::Content {
                width,
                height,
                variance,
                white_ratio,
            } => write!(f, "OK:{width}x{height}:{variance}:{white_ratio}"),
            BlankVerdict::Error(msg) => write!(f, "ERROR:{msg}"),
        }
    }
}

/// Open `path` and classify it.
pub fn check_blank(path: &Path, thresholds: &BlankThresholds) -> BlankVerdict {
    match image::open(path) {
        Ok(img) => classify(&img, thresholds),
        Err(e) => BlankVerdict::Error(e.to_string()),
    }
}

/// Classify an already-decoded image.
pub fn classify(img: &DynamicImage, thresholds: &BlankThresholds) -> BlankVerdict {
    let (width, height) = (img.width(), img.height());
    if width < thresholds.min_width || height < thresholds.min_height {
        return BlankVerdict::SmallLogo { width, height };
    }

    let pixels = luma_601(img);
    if pixels.is_empty() {
        return BlankVerdict::LowVariance { variance: 0.0 };
    }

    let variance = population_variance(&pixels);
    if variance < MIN_VARIANCE {
        return BlankVerdict::LowVariance { variance };
    }

    let white = pixels.iter().filter(|&&p| p > WHITE_LEVEL).count();
    let white_ratio = white as f64 / pixels.len() as f64;
    if white_ratio > thresholds.white_ratio {
        return BlankVerdict::MostlyWhite { white_ratio };
    }

    BlankVerdict::Content {
        width,
        height,
        variance,
        white_ratio,
    }
}

/// Grayscale with ITU-R 601 weights (299/587/114), rounded. Not `to_luma8`,
/// which weighs by Rec. 709.
fn luma_601(img: &DynamicImage) -> Vec<u8> {
    img.to_rgb8()
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0.map(u32::from);
            ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
        })
        .collect()
}

fn population_variance(pixels: &[u8]) -> f64 {
    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    pixels
        .iter()
        .map(|&p| {
            let d = p as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}
