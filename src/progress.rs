//! Progress-callback trait for indexing events.
//!
//! Pass an [`Arc<dyn IndexProgressCallback>`] to
//! [`crate::rag::RagEngine::with_progress`] to follow a paper through
//! loading, chunking, captioning and embedding. The `paper-rag ask` command
//! drives its progress bar from these events; the HTTP services use the
//! no-op default.
//!
//! # Example
//!
//! ```rust
//! use formpaper::IndexProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct EmbeddedCounter(AtomicUsize);
//!
//! impl IndexProgressCallback for EmbeddedCounter {
//!     fn on_embed_progress(&self, done: usize, total: usize) {
//!         self.0.store(done, Ordering::SeqCst);
//!         eprintln!("{done}/{total} chunks embedded");
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by [`crate::rag::RagEngine`] while it builds an index.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Caption events may arrive from concurrent tasks,
/// so shared state needs `Mutex` or atomics.
pub trait IndexProgressCallback: Send + Sync {
    /// Page texts are loaded.
    fn on_pages_loaded(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Text has been split into `chunks` chunks.
    fn on_chunked(&self, chunks: usize) {
        let _ = chunks;
    }

    /// An image caption finished (successfully or not).
    ///
    /// # Arguments
    /// * `done`: captions attempted so far
    /// * `total`: images selected for captioning
    fn on_caption_progress(&self, done: usize, total: usize) {
        let _ = (done, total);
    }

    /// One embedding batch returned.
    ///
    /// # Arguments
    /// * `done`: chunks embedded so far
    /// * `total`: chunks to embed
    fn on_embed_progress(&self, done: usize, total: usize) {
        let _ = (done, total);
    }

    /// A single item failed and was skipped.
    fn on_item_error(&self, error: &str) {
        let _ = error;
    }

    /// The index is complete with `chunks` entries.
    fn on_index_complete(&self, chunks: usize) {
        let _ = chunks;
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl IndexProgressCallback for NoopProgressCallback {}

pub type ProgressCallback = Arc<dyn IndexProgressCallback>;
