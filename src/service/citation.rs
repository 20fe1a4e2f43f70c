//! Citation backend: evidence-scored answers with `(paper12 pp. 3-4 #7)` keys.
//!
//! Indexes live in memory; a small metadata file per paper records the PDF
//! path so a restarted service can rebuild the index on first query.

use crate::error::PaperError;
use crate::rag::index::{read_json, write_json};
use crate::rag::Citation;
use crate::service::error::{ApiError, ApiResult};
use crate::service::state::{blocking, exists, AppState, LoadedPaper};
use axum::extract::{Path as UrlPath, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Browser origins of the web client allowed by CORS.
pub const ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5004",
    "http://localhost:8666",
    "http://localhost:8667",
    "http://localhost:8668",
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/paperqa/index", post(index_paper))
        .route("/api/paperqa/query", post(query_paper))
        .route("/api/paperqa/status/:paper_id", get(status))
        .route("/api/paperqa/delete/:paper_id", delete(delete_paper))
}

fn default_ollama_model() -> String {
    "llama3.1:8b".into()
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".into()
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub paper_id: i64,
    pub pdf_path: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub paper_id: i64,
    #[serde(default)]
    pub pdf_path: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub response: String,
    pub citations: Vec<Citation>,
    pub formatted_answer: String,
}

/// `indexes/paper_{id}.json`.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMetadata {
    paper_id: i64,
    pdf_path: String,
    num_docs: usize,
    indexed: bool,
    #[serde(default = "default_ollama_model")]
    ollama_model: String,
    #[serde(default)]
    embedding_model: Option<String>,
}

fn metadata_path(state: &AppState, paper_id: i64) -> PathBuf {
    state.paths.indexes_dir.join(format!("paper_{paper_id}.json"))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "PaperQA for FormPaper3001",
        "status": "running",
        "version": "1.0.0",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "paperqa"}))
}

async fn build(state: &AppState, paper_id: i64, pdf_path: &str, embedding_model: &str) -> Result<LoadedPaper, PaperError> {
    let engine = state.engine(embedding_model, "ollama").await?;
    let index = engine.build_index(paper_id, Path::new(pdf_path)).await?;
    Ok(state.cache(index, embedding_model).await)
}

async fn index_paper(State(state): State<AppState>, Json(req): Json<IndexRequest>) -> ApiResult<Value> {
    info!("Indexing paper {} from {}", req.paper_id, req.pdf_path);
    if !exists(Path::new(&req.pdf_path)).await {
        return Err(ApiError::not_found(format!("PDF not found: {}", req.pdf_path)));
    }

    let embedding_model = state.embedding_model.clone();
    let loaded = build(&state, req.paper_id, &req.pdf_path, &embedding_model)
        .await
        .map_err(|e| ApiError::with_context("Indexation error", e))?;
    let chunks = loaded.index.len();

    let metadata = IndexMetadata {
        paper_id: req.paper_id,
        pdf_path: req.pdf_path.clone(),
        num_docs: chunks,
        indexed: true,
        ollama_model: req.ollama_model,
        embedding_model: Some(embedding_model),
    };
    let path = metadata_path(&state, req.paper_id);
    let dir = state.paths.indexes_dir.clone();
    blocking("Metadata write", move || {
        std::fs::create_dir_all(&dir).map_err(|e| PaperError::io(&dir, e))?;
        write_json(&path, &metadata)
    })
    .await
    .map_err(|e| ApiError::with_context("Indexation error", e))?;

    Ok(Json(json!({
        "success": true,
        "paper_id": req.paper_id,
        "chunks": chunks,
        "message": format!("Paper {} indexed successfully with {} chunks", req.paper_id, chunks),
    })))
}

/// The cached index, or a rebuild from the recorded PDF path.
async fn load_or_rebuild(state: &AppState, paper_id: i64) -> Result<LoadedPaper, PaperError> {
    if let Some(loaded) = state.cached(paper_id).await {
        return Ok(loaded);
    }
    let path = metadata_path(state, paper_id);
    if !exists(&path).await {
        return Err(PaperError::IndexNotFound {
            paper_id,
            message: format!("Paper {paper_id} not indexed. Please index it first."),
        });
    }
    let metadata: IndexMetadata = blocking("Metadata read", move || read_json(&path)).await?;
    info!("Paper {} not in cache, re-indexing {}", paper_id, metadata.pdf_path);
    let embedding_model = metadata
        .embedding_model
        .unwrap_or_else(|| state.embedding_model.clone());
    build(state, paper_id, &metadata.pdf_path, &embedding_model).await
}

async fn query_paper(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> ApiResult<QueryResponse> {
    info!("Query for paper {}: {}", req.paper_id, req.question);
    let run = async {
        let loaded = load_or_rebuild(&state, req.paper_id).await?;
        let engine = state.engine(&loaded.embedding_model, "ollama").await?;
        let llm = state.generator("groq", &req.llm_model).await?;
        engine
            .answer_with_citations(&loaded.index, &req.question, llm.clone(), llm.as_ref())
            .await
    };
    let cited = run.await.map_err(|e| ApiError::with_context("Query error", e))?;
    info!("Query successful with {} citations", cited.citations.len());

    Ok(Json(QueryResponse {
        success: true,
        response: cited.response,
        citations: cited.citations,
        formatted_answer: cited.formatted_answer,
    }))
}

async fn status(State(state): State<AppState>, UrlPath(paper_id): UrlPath<i64>) -> ApiResult<Value> {
    let path = metadata_path(&state, paper_id);
    if !exists(&path).await {
        return Ok(Json(json!({"success": true, "indexed": false, "paper_id": paper_id})));
    }
    let metadata: IndexMetadata = blocking("Metadata read", move || read_json(&path))
        .await
        .map_err(|e| ApiError::with_context("Status error", e))?;
    Ok(Json(json!({
        "success": true,
        "indexed": true,
        "paper_id": paper_id,
        "chunks": metadata.num_docs,
    })))
}

async fn delete_paper(State(state): State<AppState>, UrlPath(paper_id): UrlPath<i64>) -> ApiResult<Value> {
    let was_cached = state.evict(paper_id).await;
    let path = metadata_path(&state, paper_id);
    let had_file = exists(&path).await;
    if had_file {
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ApiError::with_context("Delete error", PaperError::io(&path, e)))?;
    }
    if was_cached || had_file {
        Ok(Json(json!({
            "success": true,
            "paper_id": paper_id,
            "message": "Index deleted successfully",
        })))
    } else {
        Ok(Json(json!({
            "success": false,
            "paper_id": paper_id,
            "message": "No index found",
        })))
    }
}
