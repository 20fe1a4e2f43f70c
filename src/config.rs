//! Configuration types for indexing and querying papers.
//!
//! Retrieval behaviour is controlled through [`RagConfig`], built via its
//! [`RagConfigBuilder`]. Credentials and endpoint URLs that the HTTP
//! services may change at runtime (`POST /config`) live separately in
//! [`ServiceSettings`], so a `RagConfig` can be cloned freely into tasks
//! without carrying secrets around.

use crate::error::PaperError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default Ollama endpoint used for local models and embeddings.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// OpenAI-compatible endpoint of Groq's hosted models.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Settings file shared with the FormPaper backend, relative to the service.
pub const DEFAULT_SETTINGS_FILE: &str = "../backend/settings.json";

/// Configuration for building and querying a paper index.
///
/// # Example
/// ```rust
/// use formpaper::RagConfig;
///
/// let config = RagConfig::builder()
///     .chunk_size(800)
///     .chunk_overlap(100)
///     .top_k(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.top_k, 5);
/// ```
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Target chunk length in characters. Default: 1200.
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks. Default: 200.
    ///
    /// Must be strictly smaller than `chunk_size`.
    pub chunk_overlap: usize,

    /// Chunks retrieved per question. Default: 5.
    pub top_k: usize,

    /// Chunks scored for evidence in citation mode. Default: 8.
    pub evidence_k: usize,

    /// Texts sent per embedding request. Default: 32.
    pub embedding_batch_size: usize,

    /// Concurrent LLM calls when gathering evidence. Default: 4.
    pub concurrency: usize,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens per LLM answer. Default: 1024.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled on each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Timeout for embedding and metadata HTTP calls in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Minimum width and height of embedded images kept for captioning. Default: 100.
    pub min_image_side: u32,

    /// Maximum number of images captioned per document. Default: 12.
    pub max_captioned_images: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 200,
            top_k: 5,
            evidence_k: 8,
            embedding_batch_size: 32,
            concurrency: 4,
            temperature: 0.1,
            max_tokens: 1024,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            min_image_side: 100,
            max_captioned_images: 12,
        }
    }
}

impl RagConfig {
    /// Create a new builder for `RagConfig`.
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RagConfig`].
#[derive(Debug)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunk_size = n;
        self
    }

    pub fn chunk_overlap(mut self, n: usize) -> Self {
        self.config.chunk_overlap = n;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k.max(1);
        self
    }

    pub fn evidence_k(mut self, k: usize) -> Self {
        self.config.evidence_k = k.max(1);
        self
    }

    pub fn embedding_batch_size(mut self, n: usize) -> Self {
        self.config.embedding_batch_size = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn min_image_side(mut self, px: u32) -> Self {
        self.config.min_image_side = px;
        self
    }

    pub fn max_captioned_images(mut self, n: usize) -> Self {
        self.config.max_captioned_images = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RagConfig, PaperError> {
        let c = &self.config;
        if c.chunk_size < 100 {
            return Err(PaperError::InvalidConfig(format!(
                "chunk size must be at least 100 characters, got {}",
                c.chunk_size
            )));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(PaperError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.max_tokens == 0 {
            return Err(PaperError::InvalidConfig("max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Runtime settings ─────────────────────────────────────────────────────

/// Credentials and endpoints the services can update at runtime.
///
/// Handed to the provider constructors explicitly; nothing here is written
/// back to the process environment.
#[derive(Clone, Default, Deserialize)]
pub struct ServiceSettings {
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub ollama_base_url: Option<String>,
}

impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<redacted>");
        f.debug_struct("ServiceSettings")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("groq_api_key", &mask(&self.groq_api_key))
            .field("ollama_base_url", &self.ollama_base_url)
            .finish()
    }
}

impl ServiceSettings {
    /// Read initial settings from `OPENAI_API_KEY`, `GROQ_API_KEY` and
    /// `OLLAMA_BASE_URL`. Empty variables count as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            groq_api_key: var("GROQ_API_KEY"),
            ollama_base_url: var("OLLAMA_BASE_URL"),
        }
    }

    /// Merge non-empty values from `update`; returns the names of the fields
    /// that changed.
    pub fn merge(&mut self, update: ServiceSettings) -> Vec<&'static str> {
        let mut changed = Vec::new();
        let mut set = |slot: &mut Option<String>, value: Option<String>, name: &'static str| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *slot = Some(v);
                changed.push(name);
            }
        };
        set(&mut self.openai_api_key, update.openai_api_key, "openai_api_key");
        set(&mut self.groq_api_key, update.groq_api_key, "groq_api_key");
        set(&mut self.ollama_base_url, update.ollama_base_url, "ollama_base_url");
        changed
    }

    /// Read the backend's `settings.json` (`groqApiKey`, `openaiApiKey`,
    /// `ollamaBaseUrl`). A missing file yields `Ok(None)`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, PaperError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PaperError::io(path, e)),
        };
        let file: SettingsFile = serde_json::from_str(&raw).map_err(|e| {
            PaperError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        Ok(Some(Self {
            openai_api_key: file.openai_api_key,
            groq_api_key: file.groq_api_key,
            ollama_base_url: file.ollama_base_url,
        }))
    }

    pub fn ollama_base_url(&self) -> &str {
        self.ollama_base_url
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn groq_configured(&self) -> bool {
        self.groq_api_key.is_some()
    }
}

/// The backend's settings file; unrelated keys are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    groq_api_key: Option<String>,
    #[serde(default)]
    openai_api_key: Option<String>,
    #[serde(default)]
    ollama_base_url: Option<String>,
}
