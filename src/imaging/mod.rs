//! Image-side helpers shared by the CLIs and the multimodal service.
//!
//! * [`blank`]: decide whether a cover candidate is blank or a logo
//! * [`encode`]: PNG bytes, content hashes and base64 `ImageData`
//! * [`thumbnail`]: 150 px JPEG previews
//! * [`cover`]: quality score and cover selection
//! * [`export`]: write a PDF's embedded images to disk as a JSON-able report

pub mod blank;
pub mod cover;
pub mod encode;
pub mod export;
pub mod thumbnail;

pub use blank::{check_blank, BlankThresholds, BlankVerdict};
pub use cover::{quality_score, select_cover};
pub use export::{export_images, ExportedImage, ExtractionReport};
