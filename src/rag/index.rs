//! Per-paper vector index: chunks, their embeddings and brute-force search.
//!
//! A paper yields a few hundred chunks at most, so search is an exact cosine
//! scan over every vector.
//!
//! Two on-disk layouts are supported:
//!
//! * **Directory** (`save_dir` / `load_dir`): `docstore.json` holds the
//!   chunks under `"docstore/data"`, `vector_store.json` holds the vectors
//!   under `"embedding_dict"`. Chunk counts can be read from the docstore
//!   alone.
//! * **Single file** (`save_file` / `load_file`): the whole index as one
//!   JSON document.

use crate::error::PaperError;
use crate::rag::chunk::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const DOCSTORE_FILE: &str = "docstore.json";
pub const VECTOR_STORE_FILE: &str = "vector_store.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperIndex {
    pub paper_id: i64,
    pub pdf_path: String,
    pub embedding_model: String,
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Serialize, Deserialize)]
struct DocStore {
    #[serde(rename = "docstore/data")]
    data: BTreeMap<String, Chunk>,
}

#[derive(Serialize, Deserialize)]
struct VectorStore {
    #[serde(default)]
    embedding_model: String,
    embedding_dict: BTreeMap<String, Vec<f32>>,
}

impl PaperIndex {
    pub fn new(
        paper_id: i64,
        pdf_path: impl Into<String>,
        embedding_model: impl Into<String>,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, PaperError> {
        if chunks.len() != vectors.len() {
            return Err(PaperError::Internal(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        Ok(Self {
            paper_id,
            pdf_path: pdf_path.into(),
            embedding_model: embedding_model.into(),
            chunks,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `top_k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| SearchHit {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    // ── Directory layout ─────────────────────────────────────────────────

    pub fn save_dir(&self, dir: &Path) -> Result<(), PaperError> {
        std::fs::create_dir_all(dir).map_err(|e| PaperError::io(dir, e))?;

        let docstore = DocStore {
            data: self
                .chunks
                .iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
        };
        let vectors = VectorStore {
            embedding_model: self.embedding_model.clone(),
            embedding_dict: self
                .chunks
                .iter()
                .zip(&self.vectors)
                .map(|(c, v)| (c.id.clone(), v.clone()))
                .collect(),
        };
        write_json(&dir.join(DOCSTORE_FILE), &docstore)?;
        write_json(&dir.join(VECTOR_STORE_FILE), &vectors)?;
        debug!("Persisted {} chunks to {}", self.len(), dir.display());
        Ok(())
    }

    pub fn load_dir(dir: &Path, paper_id: i64, pdf_path: &str) -> Result<Self, PaperError> {
        let docstore: DocStore = read_json(&dir.join(DOCSTORE_FILE))?;
        let mut store: VectorStore = read_json(&dir.join(VECTOR_STORE_FILE))?;

        let mut chunks = Vec::with_capacity(docstore.data.len());
        let mut vectors = Vec::with_capacity(docstore.data.len());
        for (id, chunk) in docstore.data {
            let vector = store
                .embedding_dict
                .remove(&id)
                .ok_or_else(|| PaperError::CorruptIndex {
                    path: dir.to_path_buf(),
                    detail: format!("no vector for chunk '{id}'"),
                })?;
            chunks.push(chunk);
            vectors.push(vector);
        }
        Self::new(paper_id, pdf_path, store.embedding_model, chunks, vectors)
    }

    // ── Single-file layout ───────────────────────────────────────────────

    pub fn save_file(&self, path: &Path) -> Result<(), PaperError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PaperError::io(parent, e))?;
        }
        write_json(path, self)
    }

    pub fn load_file(path: &Path) -> Result<Self, PaperError> {
        read_json(path)
    }
}

/// Number of chunks in a directory-layout index, read from the docstore.
pub fn count_chunks_in_dir(dir: &Path) -> Result<usize, PaperError> {
    let docstore: DocStore = read_json(&dir.join(DOCSTORE_FILE))?;
    Ok(docstore.data.len())
}

/// Cosine similarity; 0 when either vector has zero magnitude or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// Atomic write: temp file + rename, as the index may be read concurrently.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PaperError> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| PaperError::Internal(format!("serialise {}: {e}", path.display())))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| PaperError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| PaperError::io(path, e))
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PaperError> {
    let bytes = std::fs::read(path).map_err(|e| PaperError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| PaperError::CorruptIndex {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
