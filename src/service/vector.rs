//! Vector backend: persistent per-paper indexes stored next to the PDF.
//!
//! The index for paper 12 at `MyPapers/Some Title_12/paper.pdf` lives in
//! `MyPapers/Some Title_12/12_llamaindex/` (docstore, vectors, metadata).
//! Queries find it again by scanning `papers_root`.

use crate::error::PaperError;
use crate::rag::history::{previous_conversation, ChatTurn};
use crate::rag::index::{count_chunks_in_dir, read_json, write_json, PaperIndex, DOCSTORE_FILE};
use crate::service::error::{ApiError, ApiResult};
use crate::service::state::{blocking, exists, AppState, LoadedPaper};
use crate::service::update_config;
use axum::extract::{Path as UrlPath, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub const METADATA_FILE: &str = "metadata.json";

/// Chat messages folded into the retrieval query.
const HISTORY_WINDOW: usize = 4;

/// Source excerpts are cut to this many characters.
const SOURCE_PREVIEW_CHARS: usize = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/config", post(update_config))
        .route("/index", post(index_document))
        .route("/query", post(query_document))
        .route("/status/:paper_id", get(status))
        .route("/delete/:paper_id", delete(delete_index))
        .route("/health", get(health))
}

fn default_provider() -> String {
    "groq".into()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub paper_id: i64,
    pub pdf_path: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model_name: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub paper_id: i64,
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model_name: String,
}

#[derive(Debug, Serialize)]
pub struct Source {
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub paper_id: i64,
    pub response: String,
    pub sources: Vec<Source>,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexMetadata {
    paper_id: i64,
    pdf_path: String,
    provider: String,
    model_name: String,
    chunks: usize,
    /// Unix time, seconds.
    indexed_at: f64,
    #[serde(default)]
    embedding_model: Option<String>,
}

/// `<pdf dir>/{id}_llamaindex`.
pub fn index_dir_for(pdf_path: &Path, paper_id: i64) -> PathBuf {
    pdf_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{paper_id}_llamaindex"))
}

/// First sub-folder of `papers_root` whose name contains `_{id}` and which
/// holds `{id}_llamaindex`. Folders are visited in name order.
pub fn find_index_dir(papers_root: &Path, paper_id: i64) -> Option<PathBuf> {
    let marker = format!("_{paper_id}");
    let mut folders: Vec<PathBuf> = std::fs::read_dir(papers_root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().contains(&marker))
                .unwrap_or(false)
        })
        .collect();
    folders.sort();
    folders
        .into_iter()
        .map(|f| f.join(format!("{paper_id}_llamaindex")))
        .find(|candidate| candidate.is_dir())
}

/// [`find_index_dir`] on the blocking pool.
async fn locate(state: &AppState, paper_id: i64) -> Result<Option<PathBuf>, PaperError> {
    let root = state.paths.papers_root.clone();
    blocking("Index lookup", move || Ok(find_index_dir(&root, paper_id))).await
}

fn preview(text: &str) -> String {
    if text.chars().count() > SOURCE_PREVIEW_CHARS {
        let cut: String = text.chars().take(SOURCE_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

async fn index_document(State(state): State<AppState>, Json(req): Json<IndexRequest>) -> ApiResult<Value> {
    let pdf_path = PathBuf::from(&req.pdf_path);
    if !exists(&pdf_path).await {
        return Err(ApiError::not_found(format!("PDF file not found: {}", req.pdf_path)));
    }

    let index_dir = index_dir_for(&pdf_path, req.paper_id);
    if exists(&index_dir.join(DOCSTORE_FILE)).await {
        let dir = index_dir.clone();
        let chunks = blocking("Docstore read", move || count_chunks_in_dir(&dir))
            .await
            .map_err(|e| ApiError::with_context("Error indexing document", e))?;
        info!("Paper {} already indexed ({} chunks)", req.paper_id, chunks);
        return Ok(Json(json!({
            "success": true,
            "paper_id": req.paper_id,
            "already_indexed": true,
            "chunks": chunks,
            "message": "Document already indexed",
        })));
    }

    let start = Instant::now();
    let run = async {
        // Fail early on an unusable answer model, before the embedding work.
        state.generator(&req.provider, &req.model_name).await?;
        let embedding_model = state.embedding_model.clone();
        let engine = state.engine(&embedding_model, "ollama").await?;
        let index = engine.build_index(req.paper_id, &pdf_path).await?;

        let metadata = IndexMetadata {
            paper_id: req.paper_id,
            pdf_path: req.pdf_path.clone(),
            provider: req.provider.clone(),
            model_name: req.model_name.clone(),
            chunks: index.len(),
            indexed_at: unix_now(),
            embedding_model: Some(embedding_model.clone()),
        };
        let index = persist(index, index_dir.clone(), metadata).await?;
        Ok::<_, PaperError>(state.cache(index, &embedding_model).await)
    };
    let loaded = run
        .await
        .map_err(|e| ApiError::with_context("Error indexing document", e))?;

    let secs = (start.elapsed().as_secs_f64() * 10.0).round() / 10.0;
    let chunks = loaded.index.len();
    Ok(Json(json!({
        "success": true,
        "paper_id": req.paper_id,
        "already_indexed": false,
        "chunks": chunks,
        "time_seconds": secs,
        "index_path": index_dir.to_string_lossy(),
        "message": format!("Document indexed successfully in {secs:.1}s"),
    })))
}

async fn persist(index: PaperIndex, dir: PathBuf, metadata: IndexMetadata) -> Result<PaperIndex, PaperError> {
    blocking("Persist", move || {
        index.save_dir(&dir)?;
        write_json(&dir.join(METADATA_FILE), &metadata)?;
        Ok(index)
    })
    .await
}

/// Cached index for `paper_id`, or load it from the library folder.
async fn load(state: &AppState, paper_id: i64) -> Result<LoadedPaper, PaperError> {
    if let Some(loaded) = state.cached(paper_id).await {
        return Ok(loaded);
    }
    let not_found = || PaperError::IndexNotFound {
        paper_id,
        message: format!("No index found for paper {paper_id}. Please index the document first."),
    };
    let dir = locate(state, paper_id).await?.ok_or_else(not_found)?;
    if !exists(&dir.join(DOCSTORE_FILE)).await {
        return Err(not_found());
    }

    debug!("Loading index for paper {} from {}", paper_id, dir.display());
    let (index, embedding_model) = blocking("Load", move || {
        let metadata: IndexMetadata = read_json(&dir.join(METADATA_FILE))?;
        let index = PaperIndex::load_dir(&dir, paper_id, &metadata.pdf_path)?;
        Ok((index, metadata.embedding_model))
    })
    .await?;

    let embedding_model = embedding_model.unwrap_or_else(|| state.embedding_model.clone());
    Ok(state.cache(index, &embedding_model).await)
}

async fn query_document(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> ApiResult<QueryResponse> {
    info!("Querying paper {}: {}", req.paper_id, req.question);
    let run = async {
        let loaded = load(&state, req.paper_id).await?;
        let llm = state.generator(&req.provider, &req.model_name).await?;
        let engine = state.engine(&loaded.embedding_model, "ollama").await?;
        let query = previous_conversation(&req.history, &req.question, HISTORY_WINDOW);
        engine.answer(&loaded.index, &query, llm.as_ref()).await
    };
    let answer = run
        .await
        .map_err(|e| ApiError::with_context("Error querying document", e))?;

    Ok(Json(QueryResponse {
        success: true,
        paper_id: req.paper_id,
        response: answer.response,
        sources: answer
            .sources
            .iter()
            .map(|hit| Source {
                text: preview(&hit.chunk.text),
                score: hit.score,
            })
            .collect(),
        question: req.question,
    }))
}

async fn status(State(state): State<AppState>, UrlPath(paper_id): UrlPath<i64>) -> ApiResult<Value> {
    let located = locate(&state, paper_id)
        .await
        .map_err(|e| ApiError::with_context("Error checking status", e))?;
    if let Some(dir) = located {
        let metadata_path = dir.join(METADATA_FILE);
        if exists(&dir.join(DOCSTORE_FILE)).await && exists(&metadata_path).await {
            let metadata: IndexMetadata = blocking("Metadata read", move || read_json(&metadata_path))
                .await
                .map_err(|e| ApiError::with_context("Error checking status", e))?;
            return Ok(Json(json!({
                "paper_id": paper_id,
                "indexed": true,
                "chunks": metadata.chunks,
                "indexed_at": metadata.indexed_at,
            })));
        }
    }
    Ok(Json(json!({"paper_id": paper_id, "indexed": false})))
}

async fn delete_index(State(state): State<AppState>, UrlPath(paper_id): UrlPath<i64>) -> ApiResult<Value> {
    state.evict(paper_id).await;
    let located = locate(&state, paper_id)
        .await
        .map_err(|e| ApiError::with_context("Error deleting index", e))?;
    match located {
        Some(dir) => {
            tokio::fs::remove_dir_all(&dir).await.map_err(|e| {
                ApiError::with_context("Error deleting index", PaperError::io(&dir, e))
            })?;
            info!("Deleted index {}", dir.display());
            Ok(Json(json!({
                "success": true,
                "paper_id": paper_id,
                "message": "Index deleted successfully",
            })))
        }
        None => Ok(Json(json!({
            "success": false,
            "paper_id": paper_id,
            "message": "No index found",
        }))),
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let groq_configured = state.settings.read().await.groq_configured();
    Json(json!({
        "status": "healthy",
        "service": "LlamaIndex RAG Service",
        "groq_configured": groq_configured,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_dir_sits_next_to_pdf() {
        assert_eq!(
            index_dir_for(Path::new("/lib/Title_12/paper.pdf"), 12),
            PathBuf::from("/lib/Title_12/12_llamaindex")
        );
    }

    #[test]
    fn finds_index_by_folder_marker() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("Other_3")).unwrap();
        std::fs::create_dir_all(root.path().join("Deep Nets_7/7_llamaindex")).unwrap();
        std::fs::create_dir_all(root.path().join("Shallow_71")).unwrap();

        assert_eq!(
            find_index_dir(root.path(), 7),
            Some(root.path().join("Deep Nets_7/7_llamaindex"))
        );
        assert_eq!(find_index_dir(root.path(), 3), None);
        assert_eq!(find_index_dir(&root.path().join("missing"), 7), None);
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(250);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 203);
    }
}
