//! LLM interaction: build chat messages and call the provider with retry.
//!
//! Prompt wording lives in [`crate::rag::prompts`]; this module only turns a
//! [`Prompt`] into `edgequake-llm` messages and handles transient failures.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors are frequent when several evidence calls run at
//! once. Exponential backoff (`retry_backoff_ms * 2^(attempt-1)`) spaces the
//! retries out: with 500 ms base and 3 retries the waits are 500 ms → 1 s → 2 s.

use crate::config::{RagConfig, ServiceSettings, GROQ_BASE_URL};
use crate::error::PaperError;
use crate::rag::embed::{Embedder, ProviderEmbedder};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, EmbeddingProvider, ImageData, LLMProvider, OllamaProvider,
    OpenAIProvider, ProviderFactory,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// One request: a system instruction, a user turn and optional images.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub images: Vec<ImageData>,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: ImageData) -> Self {
        self.images.push(image);
        self
    }

    fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if !self.system.is_empty() {
            messages.push(ChatMessage::system(self.system.as_str()));
        }
        if self.images.is_empty() {
            messages.push(ChatMessage::user(self.user.as_str()));
        } else {
            messages.push(ChatMessage::user_with_images(
                self.user.as_str(),
                self.images.clone(),
            ));
        }
        messages
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Produces a completion for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<Generation, PaperError>;

    /// `provider/model`, for logs and responses.
    fn model_name(&self) -> &str;
}

/// [`Generator`] backed by an `edgequake-llm` provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &RagConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Generation, PaperError> {
        let start = Instant::now();
        let messages = prompt.to_messages();
        let options = self.options();
        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.retry_backoff_ms, attempt);
                warn!(
                    "{}: retry {}/{} after {}ms",
                    self.label, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "{}: {} input tokens, {} output tokens, {:?}",
                        self.label,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(Generation {
                        content: response.content,
                        prompt_tokens: response.prompt_tokens,
                        completion_tokens: response.completion_tokens,
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    warn!("{}: attempt {} failed: {}", self.label, attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(PaperError::LlmApiError {
            message: format!(
                "{} failed after {} retries: {}",
                self.label,
                self.max_retries,
                last_err.unwrap_or_else(|| "Unknown error".to_string())
            ),
        })
    }

    fn model_name(&self) -> &str {
        &self.label
    }
}

/// Delay before retry number `attempt` (1-based).
pub fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Split `groq/llama-3.3-70b-versatile` into `("groq", "llama-3.3-70b-versatile")`.
///
/// A spec without a slash uses `default_provider`. Only the first slash
/// separates, so `openrouter/meta-llama/llama-3` keeps its model path.
pub fn split_model_spec<'a>(spec: &'a str, default_provider: &'a str) -> (&'a str, &'a str) {
    match spec.split_once('/') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => (provider, model),
        _ => (default_provider, spec),
    }
}

// ── Model construction ───────────────────────────────────────────────────

/// Resolves provider and model names into live clients.
///
/// The services hold an `Arc<dyn ModelFactory>` so tests can substitute
/// canned generators and embedders.
pub trait ModelFactory: Send + Sync {
    fn generator(
        &self,
        provider: &str,
        model: &str,
        settings: &ServiceSettings,
        config: &RagConfig,
    ) -> Result<Arc<dyn Generator>, PaperError>;

    fn embedder(
        &self,
        provider: &str,
        model: &str,
        settings: &ServiceSettings,
        config: &RagConfig,
    ) -> Result<Arc<dyn Embedder>, PaperError>;
}

/// Production factory over `edgequake-llm` providers.
///
/// Groq, OpenAI and Ollama are built from [`ServiceSettings`] directly, so a
/// key posted to `/config` takes effect on the next request. Any other
/// provider name goes through `ProviderFactory`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveModels;

impl LiveModels {
    fn require_key<'a>(key: &'a Option<String>, label: &str) -> Result<&'a str, PaperError> {
        key.as_deref().ok_or_else(|| PaperError::MissingApiKey {
            provider: label.to_string(),
        })
    }

    fn ollama(settings: &ServiceSettings) -> edgequake_llm::providers::ollama::OllamaProviderBuilder {
        OllamaProvider::builder().host(settings.ollama_base_url().trim_end_matches('/'))
    }

    fn openai_compatible(api_key: &str, base_url: &str, model: &str) -> Arc<dyn LLMProvider> {
        Arc::new(OpenAIProvider::compatible(api_key, base_url).with_model(model))
    }

    fn chat_provider(
        provider: &str,
        model: &str,
        settings: &ServiceSettings,
    ) -> Result<Arc<dyn LLMProvider>, PaperError> {
        let not_configured = |e: edgequake_llm::LlmError| PaperError::ProviderNotConfigured {
            provider: provider.to_string(),
            hint: e.to_string(),
        };
        let llm: Arc<dyn LLMProvider> = match provider {
            "groq" => {
                let key = Self::require_key(&settings.groq_api_key, "Groq")?;
                Self::openai_compatible(key, GROQ_BASE_URL, model)
            }
            "openai" => {
                let key = Self::require_key(&settings.openai_api_key, "OpenAI")?;
                Arc::new(OpenAIProvider::new(key).with_model(model))
            }
            "ollama" => Arc::new(Self::ollama(settings).model(model).build().map_err(not_configured)?),
            other => ProviderFactory::create_llm_provider(other, model).map_err(not_configured)?,
        };
        Ok(llm)
    }
}

impl ModelFactory for LiveModels {
    fn generator(
        &self,
        provider: &str,
        model: &str,
        settings: &ServiceSettings,
        config: &RagConfig,
    ) -> Result<Arc<dyn Generator>, PaperError> {
        let llm = Self::chat_provider(provider, model, settings)?;
        Ok(Arc::new(LlmGenerator::new(
            llm,
            format!("{provider}/{model}"),
            config,
        )))
    }

    fn embedder(
        &self,
        provider: &str,
        model: &str,
        settings: &ServiceSettings,
        config: &RagConfig,
    ) -> Result<Arc<dyn Embedder>, PaperError> {
        let inner: Arc<dyn EmbeddingProvider> = match provider {
            "ollama" => Arc::new(
                Self::ollama(settings)
                    .embedding_model(model)
                    .build()
                    .map_err(|e| PaperError::ProviderNotConfigured {
                        provider: provider.to_string(),
                        hint: e.to_string(),
                    })?,
            ),
            "openai" => {
                let key = Self::require_key(&settings.openai_api_key, "OpenAI")?;
                Arc::new(OpenAIProvider::new(key).with_embedding_model(model))
            }
            other => {
                return Err(PaperError::InvalidRequest(format!(
                    "unsupported embedding provider '{other}' (expected ollama or openai)"
                )))
            }
        };
        let embedder = ProviderEmbedder::new(inner, config.api_timeout_secs)
            .with_batch_size(config.embedding_batch_size);
        Ok(Arc::new(embedder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }

    #[test]
    fn model_spec_parsing() {
        assert_eq!(split_model_spec("groq/llama-3.3-70b-versatile", "openai"), ("groq", "llama-3.3-70b-versatile"));
        assert_eq!(split_model_spec("gpt-4o", "openai"), ("openai", "gpt-4o"));
        assert_eq!(split_model_spec("ollama/llama3.1:8b", "openai"), ("ollama", "llama3.1:8b"));
        assert_eq!(
            split_model_spec("openrouter/meta-llama/llama-3", "openai"),
            ("openrouter", "meta-llama/llama-3")
        );
        assert_eq!(split_model_spec("/x", "openai"), ("openai", "/x"));
    }

    #[test]
    fn groq_without_key_is_rejected() {
        let err = LiveModels
            .generator("groq", "llama-3.3-70b-versatile", &ServiceSettings::default(), &RagConfig::default())
            .err()
            .expect("missing key");
        assert_eq!(err.to_string(), "Groq API key not configured");
    }

    #[test]
    fn hosted_and_local_generators_build_from_settings() {
        let settings = ServiceSettings {
            openai_api_key: Some("sk-test".into()),
            groq_api_key: Some("gsk-test".into()),
            ollama_base_url: Some("http://gpu-box:11434/".into()),
        };
        let config = RagConfig::default();
        for (provider, model) in [
            ("groq", "llama-3.3-70b-versatile"),
            ("openai", "gpt-4o-mini"),
            ("ollama", "llama3.1:8b"),
        ] {
            let g = LiveModels
                .generator(provider, model, &settings, &config)
                .unwrap_or_else(|e| panic!("{provider}: {e}"));
            assert_eq!(g.model_name(), format!("{provider}/{model}"));
        }
        assert!(GROQ_BASE_URL.ends_with("/openai/v1"));
    }

    #[tokio::test]
    async fn openai_compatible_generator_sends_key_and_model() {
        use axum::http::HeaderMap;
        use axum::{routing::post, Json, Router};
        use serde_json::{json, Value};

        let app = Router::new().route(
            "/openai/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "created": 1,
                    "model": body["model"],
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": format!("{auth} {}", body["model"].as_str().unwrap_or_default())},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 7, "completion_tokens": 3, "total_tokens": 10}
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = RagConfig::builder().max_retries(0).build().unwrap();
        let llm = LiveModels::openai_compatible(
            "gsk-test",
            &format!("http://{addr}/openai/v1"),
            "llama-3.3-70b-versatile",
        );
        let generator = LlmGenerator::new(llm, "groq/llama-3.3-70b-versatile", &config);
        let out = generator.generate(&Prompt::new("sys", "hello")).await.unwrap();

        assert_eq!(out.content, "Bearer gsk-test llama-3.3-70b-versatile");
        assert_eq!(out.prompt_tokens, 7);
        assert_eq!(out.completion_tokens, 3);
    }

    #[test]
    fn openai_embedder_needs_key() {
        let err = LiveModels
            .embedder("openai", "text-embedding-3-small", &ServiceSettings::default(), &RagConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "OpenAI API key not configured");
    }

    #[test]
    fn ollama_embedder_uses_configured_url() {
        let settings = ServiceSettings {
            ollama_base_url: Some("http://gpu-box:11434".into()),
            ..Default::default()
        };
        let e = LiveModels
            .embedder("ollama", "nomic-embed-text", &settings, &RagConfig::default())
            .unwrap();
        assert_eq!(e.model_name(), "nomic-embed-text");
    }

    #[test]
    fn unknown_embedding_provider() {
        let err = LiveModels
            .embedder("cohere", "embed-v3", &ServiceSettings::default(), &RagConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn prompt_builder_collects_images() {
        let p = Prompt::new("sys", "user").with_image(ImageData::new("aGk=", "image/png"));
        assert_eq!(p.images.len(), 1);
        assert_eq!(p.to_messages().len(), 2);
        assert_eq!(Prompt::new("", "only user").to_messages().len(), 1);
    }
}
