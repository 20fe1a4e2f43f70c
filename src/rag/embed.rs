//! Text embeddings through `edgequake-llm` embedding providers.
//!
//! [`ProviderEmbedder`] adapts any [`EmbeddingProvider`] (Ollama's
//! `/api/embed`, OpenAI's `/v1/embeddings`) to the [`Embedder`] seam the
//! engine and the services use, adding batching, a per-call timeout and a
//! count check.

use crate::error::PaperError;
use async_trait::async_trait;
use edgequake_llm::EmbeddingProvider;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Turns texts into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts`, returning one vector per input in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PaperError>;

    /// Model identifier recorded in the index.
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PaperError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| PaperError::EmbeddingFailed("empty embedding response".into()))
    }
}

/// [`Embedder`] backed by an `edgequake-llm` provider.
pub struct ProviderEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    batch_size: usize,
    timeout: Duration,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout_secs: u64) -> Self {
        let model = provider.model().to_string();
        Self {
            provider,
            model,
            batch_size: 32,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    async fn request(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, PaperError> {
        let vectors = timeout(self.timeout, self.provider.embed(batch))
            .await
            .map_err(|_| {
                PaperError::EmbeddingFailed(format!(
                    "{} timed out after {}s",
                    self.provider.name(),
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| PaperError::EmbeddingFailed(format!("{}: {e}", self.provider.name())))?;
        if vectors.len() != batch.len() {
            return Err(PaperError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

impl std::fmt::Debug for ProviderEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEmbedder")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PaperError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!("Embedding batch of {} texts with {}", batch.len(), self.model);
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use edgequake_llm::OllamaProvider;
    use serde_json::{json, Value};

    /// Drops the last vector of every batch.
    struct ShortProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn name(&self) -> &str {
            "short"
        }

        fn model(&self) -> &str {
            "short-embed"
        }

        fn dimension(&self) -> usize {
            1
        }

        fn max_tokens(&self) -> usize {
            512
        }

        async fn embed(&self, texts: &[String]) -> edgequake_llm::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }
    }

    #[tokio::test]
    async fn count_mismatch_is_error() {
        let embedder = ProviderEmbedder::new(Arc::new(ShortProvider), 5);
        assert_eq!(embedder.model_name(), "short-embed");
        let err = embedder.embed_batch(&["a".into(), "b".into()]).await.unwrap_err();
        assert!(err.to_string().contains("expected 2"), "got: {err}");
    }

    #[tokio::test]
    async fn batches_requests_against_local_ollama() {
        // Ollama-style server: embedding = [len(text), batch size].
        let app = Router::new().route(
            "/api/embed",
            post(|Json(body): Json<Value>| async move {
                let inputs = body["input"].as_array().cloned().unwrap_or_default();
                let n = inputs.len();
                let embeddings: Vec<Value> = inputs
                    .iter()
                    .map(|t| {
                        let len = t.as_str().map_or(0, str::len);
                        json!([len as f32, n as f32])
                    })
                    .collect();
                Json(json!({"model": body["model"], "embeddings": embeddings}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let provider = OllamaProvider::builder()
            .host(format!("http://{addr}"))
            .embedding_model("nomic-embed-text")
            .build()
            .unwrap();
        let embedder = ProviderEmbedder::new(Arc::new(provider), 5).with_batch_size(2);
        let texts: Vec<String> = ["a", "bb", "ccc"].iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0, 2.0], vec![2.0, 2.0], vec![3.0, 1.0]]);
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.embed("dddd").await.unwrap(), vec![4.0, 1.0]);
    }
}
