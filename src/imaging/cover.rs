//! Cover selection among extracted images.
//!
//! Score = 0.4 × megapixels + 0.4 × (PNG bytes / 100 000) + 0.2 × aspect,
//! where aspect is 1 for near-square or moderately wide images
//! (0.7 ≤ w/h ≤ 1.5) and 0.5 otherwise.

use crate::imaging::export::ExportedImage;

pub fn quality_score(width: u32, height: u32, size: u64) -> f64 {
    let resolution = (width as f64 * height as f64) / 1_000_000.0;
    let size_score = size as f64 / 100_000.0;
    let aspect_ratio = if height > 0 {
        width as f64 / height as f64
    } else {
        1.0
    };
    let aspect = if (0.7..=1.5).contains(&aspect_ratio) {
        1.0
    } else {
        0.5
    };
    resolution * 0.4 + size_score * 0.4 + aspect * 0.2
}

/// Score every image in place and return a copy of the best one.
///
/// Ties keep the earlier image.
pub fn select_cover(images: &mut [ExportedImage]) -> Option<ExportedImage> {
    for img in images.iter_mut() {
        img.quality_score = Some(quality_score(img.width, img.height, img.size));
    }
    images
        .iter()
        .fold(None::<&ExportedImage>, |best, img| match best {
            Some(b) if b.quality_score >= img.quality_score => Some(b),
            _ => Some(img),
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(name: &str, width: u32, height: u32, size: u64) -> ExportedImage {
        ExportedImage {
            filename: name.into(),
            path: format!("/tmp/{name}"),
            page: 1,
            width,
            height,
            size,
            hash: "0".repeat(64),
            thumbnail: None,
            quality_score: None,
        }
    }

    #[test]
    fn score_formula() {
        // 1000x1000, 200 kB, square: 0.4*1 + 0.4*2 + 0.2*1
        assert!((quality_score(1000, 1000, 200_000) - 1.4).abs() < 1e-12);
        // tall banner gets the reduced aspect score
        assert!((quality_score(100, 1000, 0) - (0.4 * 0.1 + 0.1)).abs() < 1e-12);
        // zero height counts as square
        assert!((quality_score(0, 0, 0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn cover_is_highest_score_and_all_are_scored() {
        let mut images = vec![
            img("banner.png", 2000, 200, 90_000),
            img("figure.png", 800, 700, 150_000),
            img("icon.png", 120, 120, 2_000),
        ];
        let cover = select_cover(&mut images).unwrap();
        assert_eq!(cover.filename, "figure.png");
        assert!(images.iter().all(|i| i.quality_score.is_some()));
    }

    #[test]
    fn no_images_no_cover() {
        assert!(select_cover(&mut []).is_none());
    }
}
