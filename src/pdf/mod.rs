//! PDF access: everything that touches pdfium lives here.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdfium ──▶ document ──▶ (page text, metadata)
//!                  └─▶ images   ──▶ (embedded bitmaps)
//! ```
//!
//! 1. [`input`]: canonicalise a path or URL to a local file and check
//!    the `%PDF` magic bytes
//! 2. [`pdfium`]: bind the pdfium shared library
//! 3. [`document`]: open a document, read page text and metadata
//! 4. [`images`]: pull embedded image objects out of each page
//!
//! pdfium is not async-safe, so every async entry point here hops onto
//! `spawn_blocking`.

pub mod document;
pub mod images;
pub mod input;
pub mod pdfium;

pub use document::{document_info, extract_page_texts, DocumentInfo};
pub use images::{extract_embedded_images, EmbeddedImage};
pub use input::{check_local_pdf, resolve_input, ResolvedInput};
