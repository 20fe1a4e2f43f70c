//! # formpaper-tools
//!
//! PDF helpers and question-answering services behind the FormPaper
//! paper-management app.
//!
//! ## What is in here?
//!
//! ```text
//! CLI tools
//!  ├─ check-blank-image  is a cover candidate blank, a logo, or real content?
//!  ├─ extract-images     embedded figures → PNG files + thumbnails + cover pick
//!  └─ extract-doi        DOI from the first pages → CrossRef metadata (JSON)
//!
//! paper-rag
//!  ├─ serve --backend citation    evidence-scored answers with citation keys
//!  ├─ serve --backend vector      persistent per-paper vector index
//!  ├─ serve --backend multimodal  text + figure captions
//!  └─ ask <pdf> <question>        one-shot local answer
//! ```
//!
//! Every tool prints machine-readable output on stdout (a status line or a
//! JSON document); logs go to stderr.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formpaper::rag::{LiveModels, ModelFactory, PdfiumLoader, RagEngine};
//! use formpaper::{RagConfig, ServiceSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RagConfig::default();
//!     let embedder = LiveModels.embedder("ollama", "nomic-embed-text", &ServiceSettings::from_env(), &config)?;
//!     let engine = RagEngine::new(Arc::new(PdfiumLoader), embedder, config);
//!     let index = engine.build_index(1, "paper.pdf".as_ref()).await?;
//!     eprintln!("{} chunks", index.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! formpaper-tools = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod doi;
pub mod error;
pub mod imaging;
pub mod pdf;
pub mod progress;
pub mod rag;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RagConfig, RagConfigBuilder, ServiceSettings};
pub use doi::{doi_from_pdf, find_doi, validate_doi, CrossRefClient, DoiMetadata};
pub use error::{ItemError, PaperError};
pub use imaging::{check_blank, export_images, BlankThresholds, BlankVerdict, ExtractionReport};
pub use progress::{IndexProgressCallback, NoopProgressCallback, ProgressCallback};
pub use rag::{PaperIndex, RagEngine};
pub use service::{AppState, Backend, ServicePaths};
