//! Retrieval-augmented question answering over a single paper.
//!
//! ## Data Flow
//!
//! ```text
//! index:  pages ──▶ clean ──▶ chunk ──▶ (caption) ──▶ embed ──▶ PaperIndex
//! query:  question ──▶ embed ──▶ search ──▶ prompt ──▶ Generator ──▶ answer
//! ```
//!
//! Every external dependency sits behind a trait so the services can be
//! tested without PDFium or network access:
//!
//! * [`engine::DocumentLoader`]: page text and embedded images
//! * [`embed::Embedder`]: text → vectors
//! * [`llm::Generator`]: messages → completion
//! * [`llm::ModelFactory`]: `(provider, model)` → embedder / generator

pub mod chunk;
pub mod clean;
pub mod embed;
pub mod engine;
pub mod history;
pub mod index;
pub mod llm;
pub mod prompts;

pub use chunk::{Chunk, ChunkKind};
pub use embed::{Embedder, ProviderEmbedder};
pub use engine::{Answer, Citation, CitedAnswer, DocumentLoader, PdfiumLoader, RagEngine};
pub use history::ChatTurn;
pub use index::{PaperIndex, SearchHit};
pub use llm::{Generation, Generator, LiveModels, LlmGenerator, ModelFactory};
