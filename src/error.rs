//! Error types for the formpaper library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PaperError`] is **fatal**: the operation cannot proceed at all
//!   (missing PDF, unbindable pdfium, unconfigured provider, no index).
//!   Returned as `Err(PaperError)` from every public entry point and mapped
//!   to an HTTP status by [`PaperError::status_code`] in the services.
//!
//! * [`ItemError`] is **non-fatal**: one embedded image or one evidence call
//!   failed while the rest of the document is fine. These are logged and the
//!   item is skipped.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the formpaper library.
#[derive(Debug, Error)]
pub enum PaperError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{}'\nFirst bytes: {magic:?}", path.display())]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{}' is corrupt: {detail}", path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none (or the wrong one) was provided.
    #[error("PDF '{}' is encrypted and requires a password", path.display())]
    PasswordRequired { path: PathBuf },

    /// The PDF opened but carries no extractable text layer.
    #[error("No text could be extracted from '{}'", path.display())]
    NoText { path: PathBuf },

    // ── DOI errors ────────────────────────────────────────────────────────
    /// None of the DOI patterns matched a valid DOI.
    #[error("No DOI found in '{}'", path.display())]
    DoiNotFound { path: PathBuf },

    /// CrossRef (or another metadata API) could not be reached or answered
    /// with a non-success status.
    #[error("Metadata lookup failed for '{doi}': {reason}")]
    LookupFailed { doi: String, reason: String },

    // ── RAG errors ────────────────────────────────────────────────────────
    /// The embedding endpoint returned an error or a malformed payload.
    #[error("Embedding request failed: {0}")]
    EmbeddingFailed(String),

    /// The configured provider is not initialised (missing API key etc.).
    #[error("{provider} provider is not configured: {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A hosted provider was selected but no API key has been configured.
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: String },

    /// The LLM API returned an error after all retries.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// No in-memory or on-disk index exists for the paper.
    #[error("{message}")]
    IndexNotFound { paper_id: i64, message: String },

    /// The on-disk index exists but cannot be parsed.
    #[error("Index at '{}' is unreadable: {detail}", path.display())]
    CorruptIndex { path: PathBuf, detail: String },

    /// Request body failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read or write a file or directory.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaperError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PaperError::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status the services answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PaperError::FileNotFound { .. }
            | PaperError::IndexNotFound { .. }
            | PaperError::DoiNotFound { .. } => 404,
            PaperError::InvalidRequest(_)
            | PaperError::NotAPdf { .. }
            | PaperError::ProviderNotConfigured { .. }
            | PaperError::MissingApiKey { .. } => 400,
            PaperError::PermissionDenied { .. } => 403,
            PaperError::LookupFailed { .. }
            | PaperError::DownloadFailed { .. }
            | PaperError::EmbeddingFailed(_)
            | PaperError::LlmApiError { .. } => 502,
            _ => 500,
        }
    }
}

/// A non-fatal error for a single item (image, chunk, evidence call).
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// An embedded image could not be decoded or written.
    #[error("Page {page}, image {index}: {detail}")]
    ImageFailed {
        page: usize,
        index: usize,
        detail: String,
    },

    /// The thumbnail of an extracted image could not be produced.
    #[error("Thumbnail for '{filename}' failed: {detail}")]
    ThumbnailFailed { filename: String, detail: String },

    /// An LLM call for a single chunk failed after retries.
    #[error("Chunk {chunk}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        chunk: usize,
        retries: u32,
        detail: String,
    },
}
