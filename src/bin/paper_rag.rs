//! `paper-rag`: run a RAG backend for the web client, or ask one question
//! about a local PDF from the terminal.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use formpaper::rag::llm::split_model_spec;
use formpaper::rag::{LiveModels, ModelFactory, PdfiumLoader};
use formpaper::service::{self, Backend};
use formpaper::config::DEFAULT_SETTINGS_FILE;
use formpaper::{AppState, IndexProgressCallback, RagConfig, RagEngine, ServicePaths, ServiceSettings};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress for `ask`: a spinner while the PDF loads, then a bar
/// over the chunks being embedded.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Indexing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl IndexProgressCallback for CliProgress {
    fn on_pages_loaded(&self, total_pages: usize) {
        self.bar.set_message(format!("{total_pages} pages read, chunking…"));
    }

    fn on_chunked(&self, chunks: usize) {
        self.bar.set_message(format!("{chunks} text chunks"));
    }

    fn on_caption_progress(&self, done: usize, total: usize) {
        self.bar.set_message(format!("describing figures {done}/{total}"));
    }

    fn on_embed_progress(&self, done: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>4}/{len} chunks  ⏱ {elapsed_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            self.bar.set_length(total as u64);
            self.bar.set_prefix("Embedding");
        }
        self.bar.set_position(done as u64);
    }

    fn on_item_error(&self, error: &str) {
        self.bar.println(format!("  \x1b[31m✗\x1b[0m {error}"));
    }

    fn on_index_complete(&self, _chunks: usize) {
        self.bar.finish_and_clear();
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "paper-rag",
    version,
    about = "Question answering over scientific papers",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPER_RAG_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve one of the HTTP backends.
    Serve(ServeArgs),
    /// Index a PDF in memory and answer one question.
    Ask(AskArgs),
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    /// Ollama endpoint for local models and embeddings.
    #[arg(long, env = "OLLAMA_BASE_URL")]
    ollama_base_url: Option<String>,

    /// Backend settings file read for `groqApiKey` at startup; flags and
    /// environment variables take precedence.
    #[arg(long, env = "PAPER_RAG_SETTINGS_FILE", default_value = DEFAULT_SETTINGS_FILE)]
    settings_file: PathBuf,
}

impl Credentials {
    fn into_settings(self) -> Result<ServiceSettings> {
        let mut settings = ServiceSettings::default();
        match ServiceSettings::from_file(&self.settings_file)
            .with_context(|| format!("Cannot read {}", self.settings_file.display()))?
        {
            Some(file) => {
                let loaded = settings.merge(file);
                info!("Loaded {:?} from {}", loaded, self.settings_file.display());
            }
            None => debug!("No settings file at {}", self.settings_file.display()),
        }
        settings.merge(ServiceSettings {
            openai_api_key: self.openai_api_key,
            groq_api_key: self.groq_api_key,
            ollama_base_url: self.ollama_base_url,
        });
        Ok(settings)
    }
}

#[derive(Args, Debug)]
struct Tuning {
    /// Chunk length in characters.
    #[arg(long, env = "PAPER_RAG_CHUNK_SIZE", default_value_t = 1200)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "PAPER_RAG_CHUNK_OVERLAP", default_value_t = 200)]
    chunk_overlap: usize,

    /// Chunks retrieved per question.
    #[arg(long, env = "PAPER_RAG_TOP_K", default_value_t = 5)]
    top_k: usize,

    /// Concurrent LLM calls (evidence, captions).
    #[arg(short, long, env = "PAPER_RAG_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per LLM call.
    #[arg(long, env = "PAPER_RAG_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Timeout for LLM and embedding calls, in seconds.
    #[arg(long, env = "PAPER_RAG_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

impl Tuning {
    fn build(&self) -> Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .concurrency(self.concurrency)
            .max_retries(self.max_retries)
            .api_timeout_secs(self.api_timeout)
            .build()
            .context("Invalid RAG configuration")
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Backend to run.
    #[arg(long, value_enum, env = "PAPER_RAG_BACKEND")]
    backend: Backend,

    #[arg(long, env = "PAPER_RAG_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Default: 8000 for citation, 5005 otherwise.
    #[arg(long, env = "PAPER_RAG_PORT")]
    port: Option<u16>,

    /// Library folder holding one sub-folder per paper (vector backend).
    #[arg(long, env = "PAPER_RAG_PAPERS_ROOT", default_value = "./MyPapers")]
    papers_root: PathBuf,

    /// Per-paper storage (multimodal backend).
    #[arg(long, env = "PAPER_RAG_STORAGE_DIR", default_value = "./rag_storage")]
    storage_dir: PathBuf,

    /// Index metadata files (citation backend).
    #[arg(long, env = "PAPER_RAG_INDEXES_DIR", default_value = "./indexes")]
    indexes_dir: PathBuf,

    /// Embedding model for the citation and vector backends, as `provider/model`.
    #[arg(long, env = "PAPER_RAG_EMBEDDING_MODEL", default_value = "ollama/nomic-embed-text")]
    embedding_model: String,

    #[command(flatten)]
    credentials: Credentials,

    #[command(flatten)]
    tuning: Tuning,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// PDF file or HTTP(S) URL.
    pdf: String,

    question: String,

    /// Answer model as `provider/model` (e.g. `groq/llama-3.3-70b-versatile`).
    #[arg(long, env = "PAPER_RAG_MODEL", default_value = "ollama/llama3.1:8b")]
    model: String,

    /// Embedding model as `provider/model`.
    #[arg(long, env = "PAPER_RAG_EMBEDDING_MODEL", default_value = "ollama/nomic-embed-text")]
    embedding_model: String,

    /// Score evidence and answer with citation keys.
    #[arg(long)]
    cite: bool,

    /// Print the answer as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PAPER_RAG_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    credentials: Credentials,

    #[command(flatten)]
    tuning: Tuning,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet_for_bar = matches!(&cli.command, Command::Ask(a) if !a.no_progress && !a.json);
    let filter = if cli.verbose {
        "debug"
    } else if quiet_for_bar {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Ask(args) => ask(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.tuning.build()?;
    let settings = args.credentials.into_settings()?;

    let paths = ServicePaths {
        papers_root: args.papers_root,
        storage_dir: args.storage_dir,
        indexes_dir: args.indexes_dir,
    };
    let state = AppState::new(
        settings,
        Arc::new(LiveModels),
        Arc::new(PdfiumLoader),
        config,
        paths,
    )
    .with_embedding_model(args.embedding_model);

    let port = args.port.unwrap_or_else(|| args.backend.default_port());
    let addr: SocketAddr = format!("{}:{}", args.host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, port))?;

    service::serve(args.backend, addr, state)
        .await
        .context("Server stopped")
}

async fn ask(args: AskArgs) -> Result<()> {
    let config = args.tuning.build()?;
    let settings = args.credentials.into_settings()?;

    let input = formpaper::pdf::resolve_input(&args.pdf, config.download_timeout_secs)
        .await
        .with_context(|| format!("Cannot open {}", args.pdf))?;

    let models = LiveModels;
    let (e_provider, e_model) = split_model_spec(&args.embedding_model, "ollama");
    let embedder = models
        .embedder(e_provider, e_model, &settings, &config)
        .context("Embedding model unavailable")?;
    let (provider, model) = split_model_spec(&args.model, "ollama");
    let llm = models
        .generator(provider, model, &settings, &config)
        .context("Answer model unavailable")?;

    let mut engine = RagEngine::new(Arc::new(PdfiumLoader), embedder, config);
    if !args.no_progress && !args.json {
        engine = engine.with_progress(CliProgress::new());
    }
    let index = engine
        .build_index(0, input.path())
        .await
        .context("Indexing failed")?;

    if args.cite {
        let cited = engine
            .answer_with_citations(&index, &args.question, llm.clone(), llm.as_ref())
            .await
            .context("Answering failed")?;
        if args.json {
            let out = serde_json::json!({
                "response": cited.response,
                "citations": cited.citations,
                "formatted_answer": cited.formatted_answer,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{}", cited.formatted_answer);
        }
    } else {
        let answer = engine
            .answer(&index, &args.question, llm.as_ref())
            .await
            .context("Answering failed")?;
        if args.json {
            let sources: Vec<_> = answer
                .sources
                .iter()
                .map(|h| serde_json::json!({"pages": h.chunk.pages_label(), "score": h.score}))
                .collect();
            let out = serde_json::json!({"response": answer.response, "sources": sources});
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{}", answer.response);
            let pages: Vec<String> = answer.sources.iter().map(|h| h.chunk.pages_label()).collect();
            eprintln!("\x1b[2msources: {}\x1b[0m", pages.join(", "));
        }
    }
    Ok(())
}
