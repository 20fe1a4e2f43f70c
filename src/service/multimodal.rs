//! Multimodal backend: text chunks plus vision-model captions of the
//! paper's figures, one `index.json` per paper under the storage directory.

use crate::error::PaperError;
use crate::rag::history::{transcript, ChatTurn};
use crate::rag::index::PaperIndex;
use crate::service::error::{ApiError, ApiResult};
use crate::service::state::{blocking, exists, AppState, LoadedPaper};
use crate::service::update_config;
use axum::extract::{Path as UrlPath, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

pub const INDEX_FILE: &str = "index.json";

/// Chat messages (three exchanges) folded into the query.
const HISTORY_WINDOW: usize = 6;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/config", post(update_config))
        .route("/process", post(process_document))
        .route("/query", post(query_document))
        .route("/status/:paper_id", get(status))
        .route("/delete/:paper_id", delete(delete_document))
        .route("/health", get(health))
}

fn default_llm_model() -> String {
    "gpt-4o".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub paper_id: i64,
    pub pdf_path: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub paper_id: i64,
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
}

fn storage_for(state: &AppState, paper_id: i64) -> PathBuf {
    state.paths.storage_dir.join(paper_id.to_string())
}

async fn process_document(State(state): State<AppState>, Json(req): Json<ProcessRequest>) -> ApiResult<Value> {
    if !exists(Path::new(&req.pdf_path)).await {
        return Err(ApiError::not_found(format!("PDF file not found: {}", req.pdf_path)));
    }
    let storage = storage_for(&state, req.paper_id);
    info!("Processing document {} for paper {}", req.pdf_path, req.paper_id);

    let run = async {
        let vision = state.generator_from_spec(&req.llm_model, "openai").await?;
        let engine = state.engine(&req.embedding_model, "openai").await?;
        let mut index = engine
            .build_multimodal_index(req.paper_id, Path::new(&req.pdf_path), vision)
            .await?;
        // Keep the full spec so a reload picks the same provider.
        index.embedding_model = req.embedding_model.clone();

        let path = storage.join(INDEX_FILE);
        let index = blocking("Persist", move || {
            index.save_file(&path)?;
            Ok(index)
        })
        .await?;
        Ok::<_, PaperError>(state.cache(index, &req.embedding_model).await)
    };
    run.await
        .map_err(|e| ApiError::with_context("Error processing document", e))?;

    Ok(Json(json!({
        "success": true,
        "paper_id": req.paper_id.to_string(),
        "message": "Document processed successfully",
        "storage_path": storage.to_string_lossy(),
    })))
}

/// Loaded instance, or reload from storage.
async fn load(state: &AppState, paper_id: i64) -> Result<LoadedPaper, PaperError> {
    if let Some(loaded) = state.cached(paper_id).await {
        return Ok(loaded);
    }
    let path = storage_for(state, paper_id).join(INDEX_FILE);
    if !exists(&path).await {
        return Err(PaperError::IndexNotFound {
            paper_id,
            message: format!("No processed document found for paper {paper_id}"),
        });
    }
    let index = blocking("Load", move || PaperIndex::load_file(&path)).await?;
    let embedding_model = index.embedding_model.clone();
    Ok(state.cache(index, &embedding_model).await)
}

async fn query_document(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> ApiResult<Value> {
    info!("Querying RAG for paper {}: {}", req.paper_id, req.question);
    let run = async {
        let loaded = load(&state, req.paper_id).await?;
        let llm = state.generator_from_spec(&req.llm_model, "openai").await?;
        let engine = state.engine(&loaded.embedding_model, "openai").await?;
        let query = transcript(&req.history, &req.question, HISTORY_WINDOW);
        engine.answer(&loaded.index, &query, llm.as_ref()).await
    };
    let answer = run
        .await
        .map_err(|e| ApiError::with_context("Error querying document", e))?;

    Ok(Json(json!({
        "success": true,
        "paper_id": req.paper_id.to_string(),
        "response": answer.response,
        "question": req.question,
    })))
}

async fn status(State(state): State<AppState>, UrlPath(paper_id): UrlPath<i64>) -> Json<Value> {
    let storage = storage_for(&state, paper_id);
    let processed = exists(&storage).await;
    let loaded = state.cached(paper_id).await.is_some();
    Json(json!({
        "paper_id": paper_id,
        "processed": processed,
        "loaded": loaded,
        "storage_path": processed.then(|| storage.to_string_lossy().into_owned()),
    }))
}

async fn delete_document(State(state): State<AppState>, UrlPath(paper_id): UrlPath<i64>) -> ApiResult<Value> {
    state.evict(paper_id).await;
    let storage = storage_for(&state, paper_id);
    if exists(&storage).await {
        tokio::fs::remove_dir_all(&storage).await.map_err(|e| {
            ApiError::with_context("Error deleting document", PaperError::io(&storage, e))
        })?;
    }
    Ok(Json(json!({
        "success": true,
        "paper_id": paper_id,
        "message": "Document data deleted",
    })))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "RAG-Anything Service",
        "loaded_documents": state.loaded_count().await,
    }))
}
