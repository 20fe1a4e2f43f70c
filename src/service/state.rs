//! Shared state handed to every handler.

use crate::config::{RagConfig, ServiceSettings};
use crate::error::PaperError;
use crate::rag::embed::Embedder;
use crate::rag::llm::{split_model_spec, Generator, ModelFactory};
use crate::rag::{DocumentLoader, PaperIndex, RagEngine};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default embedding model for the citation and vector backends.
pub const DEFAULT_EMBEDDING_MODEL: &str = "ollama/nomic-embed-text";

/// Where each backend keeps its per-paper artifacts.
#[derive(Debug, Clone)]
pub struct ServicePaths {
    /// Library folder scanned by the vector backend (`<root>/<name>_{id}/{id}_llamaindex`).
    pub papers_root: PathBuf,
    /// Multimodal storage root (`<dir>/{id}/index.json`).
    pub storage_dir: PathBuf,
    /// Citation backend metadata (`<dir>/paper_{id}.json`).
    pub indexes_dir: PathBuf,
}

impl Default for ServicePaths {
    fn default() -> Self {
        Self {
            papers_root: PathBuf::from("./MyPapers"),
            storage_dir: PathBuf::from("./rag_storage"),
            indexes_dir: PathBuf::from("./indexes"),
        }
    }
}

/// An index held in memory with the model spec it was embedded with.
#[derive(Clone)]
pub struct LoadedPaper {
    pub index: Arc<PaperIndex>,
    pub embedding_model: String,
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RwLock<ServiceSettings>>,
    pub models: Arc<dyn ModelFactory>,
    pub loader: Arc<dyn DocumentLoader>,
    pub config: RagConfig,
    pub paths: ServicePaths,
    /// `provider/model` used for embeddings when a request does not name one.
    pub embedding_model: String,
    pub papers: Arc<RwLock<HashMap<i64, LoadedPaper>>>,
}

impl AppState {
    pub fn new(
        settings: ServiceSettings,
        models: Arc<dyn ModelFactory>,
        loader: Arc<dyn DocumentLoader>,
        config: RagConfig,
        paths: ServicePaths,
    ) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            models,
            loader,
            config,
            paths,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            papers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_embedding_model(mut self, spec: impl Into<String>) -> Self {
        self.embedding_model = spec.into();
        self
    }

    pub async fn generator(&self, provider: &str, model: &str) -> Result<Arc<dyn Generator>, PaperError> {
        let settings = self.settings.read().await;
        self.models.generator(provider, model, &settings, &self.config)
    }

    /// Resolve `provider/model` (default provider `default_provider`).
    pub async fn generator_from_spec(
        &self,
        spec: &str,
        default_provider: &str,
    ) -> Result<Arc<dyn Generator>, PaperError> {
        let (provider, model) = split_model_spec(spec, default_provider);
        self.generator(provider, model).await
    }

    pub async fn embedder(&self, spec: &str, default_provider: &str) -> Result<Arc<dyn Embedder>, PaperError> {
        let (provider, model) = split_model_spec(spec, default_provider);
        let settings = self.settings.read().await;
        self.models.embedder(provider, model, &settings, &self.config)
    }

    /// A [`RagEngine`] embedding with `spec`.
    pub async fn engine(&self, spec: &str, default_provider: &str) -> Result<RagEngine, PaperError> {
        let embedder = self.embedder(spec, default_provider).await?;
        Ok(RagEngine::new(
            Arc::clone(&self.loader),
            embedder,
            self.config.clone(),
        ))
    }

    pub async fn cached(&self, paper_id: i64) -> Option<LoadedPaper> {
        self.papers.read().await.get(&paper_id).cloned()
    }

    pub async fn cache(&self, index: PaperIndex, embedding_model: &str) -> LoadedPaper {
        let loaded = LoadedPaper {
            index: Arc::new(index),
            embedding_model: embedding_model.to_string(),
        };
        self.papers
            .write()
            .await
            .insert(loaded.index.paper_id, loaded.clone());
        loaded
    }

    pub async fn evict(&self, paper_id: i64) -> bool {
        self.papers.write().await.remove(&paper_id).is_some()
    }

    pub async fn loaded_count(&self) -> usize {
        self.papers.read().await.len()
    }
}

/// Run filesystem work on the blocking pool.
pub(crate) async fn blocking<T, F>(what: &str, work: F) -> Result<T, PaperError>
where
    F: FnOnce() -> Result<T, PaperError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PaperError::Internal(format!("{what} task panicked: {e}")))?
}

/// `Path::exists` without blocking the runtime; unreadable counts as absent.
pub(crate) async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
