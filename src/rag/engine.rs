//! Index building and question answering over a single paper.
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Load     page texts (pdfium, spawn_blocking)
//!  ├─ 2. Clean    normalise whitespace, hyphenation, invisible chars
//!  ├─ 3. Chunk    overlapping windows with page spans
//!  ├─ 4. Caption  (multimodal only) vision model describes embedded figures
//!  ├─ 5. Embed    batched calls to the embedding endpoint
//!  └─ 6. Index    PaperIndex, ready for cosine search
//! ```
//!
//! Answering embeds the query, takes the top-k chunks and sends them to a
//! [`Generator`]. Cited answers add an evidence pass: every retrieved chunk
//! is scored and summarised by a (usually cheap, local) model, concurrently,
//! and only the relevant summaries reach the final answer.

use crate::config::RagConfig;
use crate::error::{ItemError, PaperError};
use crate::imaging::encode::{image_data, png_bytes};
use crate::pdf::{check_local_pdf, extract_embedded_images, extract_page_texts, EmbeddedImage};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::rag::chunk::{chunk_pages, Chunk, ChunkKind};
use crate::rag::clean::clean_page_text;
use crate::rag::embed::Embedder;
use crate::rag::index::{PaperIndex, SearchHit};
use crate::rag::llm::{Generator, Prompt};
use crate::rag::prompts;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reads the text layer and embedded images of a PDF.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// One string per page, in page order.
    async fn load_pages(&self, pdf_path: &Path) -> Result<Vec<String>, PaperError>;

    async fn load_images(
        &self,
        pdf_path: &Path,
        min_side: u32,
    ) -> Result<Vec<EmbeddedImage>, PaperError>;
}

/// [`DocumentLoader`] backed by pdfium.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumLoader;

#[async_trait]
impl DocumentLoader for PdfiumLoader {
    async fn load_pages(&self, pdf_path: &Path) -> Result<Vec<String>, PaperError> {
        let path = check_local_pdf(pdf_path)?;
        extract_page_texts(&path, None).await
    }

    async fn load_images(
        &self,
        pdf_path: &Path,
        min_side: u32,
    ) -> Result<Vec<EmbeddedImage>, PaperError> {
        let path = check_local_pdf(pdf_path)?;
        extract_embedded_images(&path, min_side).await
    }
}

/// Answer plus the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    pub sources: Vec<SearchHit>,
}

/// One piece of evidence behind a cited answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Relevance summary written by the evidence model.
    pub text: String,
    /// Relevance score, 1 to 10.
    pub score: u8,
    /// `paper{id} {pages} #{chunk}`, the key used in the answer text.
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct CitedAnswer {
    pub response: String,
    pub citations: Vec<Citation>,
    /// Question, answer and a numbered reference list.
    pub formatted_answer: String,
}

/// Reply used when no retrieved passage is relevant.
pub const CANNOT_ANSWER: &str = "I cannot answer.";

pub struct RagEngine {
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn Embedder>,
    config: RagConfig,
    progress: ProgressCallback,
}

impl RagEngine {
    pub fn new(loader: Arc<dyn DocumentLoader>, embedder: Arc<dyn Embedder>, config: RagConfig) -> Self {
        Self {
            loader,
            embedder,
            config,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    // ── Indexing ─────────────────────────────────────────────────────────

    /// Build a text-only index for `pdf_path`.
    pub async fn build_index(&self, paper_id: i64, pdf_path: &Path) -> Result<PaperIndex, PaperError> {
        let start = Instant::now();
        let chunks = self.text_chunks(pdf_path).await?;
        if chunks.is_empty() {
            return Err(PaperError::NoText {
                path: pdf_path.to_path_buf(),
            });
        }
        let index = self.embed_into_index(paper_id, pdf_path, chunks).await?;
        info!(
            "Indexed paper {} ({} chunks) in {:.1}s",
            paper_id,
            index.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(index)
    }

    /// Build an index of text chunks plus one [`ChunkKind::Image`] chunk per
    /// captioned figure. `vision` must accept image attachments.
    pub async fn build_multimodal_index(
        &self,
        paper_id: i64,
        pdf_path: &Path,
        vision: Arc<dyn Generator>,
    ) -> Result<PaperIndex, PaperError> {
        let start = Instant::now();
        let mut chunks = self.text_chunks(pdf_path).await?;

        let images = self
            .loader
            .load_images(pdf_path, self.config.min_image_side)
            .await?;
        let captions = self.caption_images(images, vision).await?;
        let first_id = chunks.len();
        chunks.extend(captions.into_iter().enumerate().map(|(i, (page, caption))| Chunk {
            id: format!("node-{:04}", first_id + i),
            text: format!("Figure on page {page}: {caption}"),
            page_start: page,
            page_end: page,
            kind: ChunkKind::Image,
        }));

        if chunks.is_empty() {
            return Err(PaperError::NoText {
                path: pdf_path.to_path_buf(),
            });
        }
        let index = self.embed_into_index(paper_id, pdf_path, chunks).await?;
        info!(
            "Processed paper {} ({} chunks, {} from figures) in {:.1}s",
            paper_id,
            index.len(),
            index.chunks.iter().filter(|c| c.kind == ChunkKind::Image).count(),
            start.elapsed().as_secs_f64()
        );
        Ok(index)
    }

    async fn text_chunks(&self, pdf_path: &Path) -> Result<Vec<Chunk>, PaperError> {
        let pages = self.loader.load_pages(pdf_path).await?;
        self.progress.on_pages_loaded(pages.len());
        let cleaned: Vec<String> = pages.iter().map(|p| clean_page_text(p)).collect();
        let chunks = chunk_pages(&cleaned, self.config.chunk_size, self.config.chunk_overlap, 0);
        debug!("{} pages → {} chunks", pages.len(), chunks.len());
        self.progress.on_chunked(chunks.len());
        Ok(chunks)
    }

    /// Caption the largest images (up to `max_captioned_images`), returning
    /// `(page, caption)` in document order. Failed captions are skipped.
    async fn caption_images(
        &self,
        mut images: Vec<EmbeddedImage>,
        vision: Arc<dyn Generator>,
    ) -> Result<Vec<(usize, String)>, PaperError> {
        images.sort_by_key(|img| std::cmp::Reverse(u64::from(img.width()) * u64::from(img.height())));
        images.truncate(self.config.max_captioned_images);
        images.sort_by_key(|img| (img.page, img.index));
        if images.is_empty() {
            return Ok(Vec::new());
        }

        // PNG encoding is CPU-bound.
        let encoded = tokio::task::spawn_blocking(move || {
            images
                .iter()
                .filter_map(|img| match png_bytes(&img.image) {
                    Ok(png) => Some((img.page, png)),
                    Err(e) => {
                        warn!(
                            "{}",
                            ItemError::ImageFailed {
                                page: img.page,
                                index: img.index,
                                detail: e.to_string(),
                            }
                        );
                        None
                    }
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| PaperError::Internal(format!("Encode task panicked: {}", e)))?;

        let total = encoded.len();
        let done = std::sync::atomic::AtomicUsize::new(0);
        let progress = Arc::clone(&self.progress);
        let max_retries = self.config.max_retries;
        let results: Vec<Option<(usize, String)>> = stream::iter(encoded.into_iter().enumerate().map(
            |(i, (page, png))| {
                let vision = Arc::clone(&vision);
                let progress = Arc::clone(&progress);
                let done = &done;
                async move {
                    let prompt = Prompt::new(
                        prompts::CAPTION_SYSTEM_PROMPT,
                        prompts::caption_user_prompt(page),
                    )
                    .with_image(image_data(&png));
                    let result = vision.generate(&prompt).await;
                    let n = done.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                    progress.on_caption_progress(n, total);
                    match result {
                        Ok(g) if !g.content.trim().is_empty() => Some((page, g.content.trim().to_string())),
                        Ok(_) => None,
                        Err(e) => {
                            let err = ItemError::LlmFailed {
                                chunk: i,
                                retries: max_retries,
                                detail: e.to_string(),
                            };
                            warn!("Caption skipped: {}", err);
                            progress.on_item_error(&err.to_string());
                            None
                        }
                    }
                }
            },
        ))
        .buffered(self.config.concurrency)
        .collect()
        .await;

        Ok(results.into_iter().flatten().collect())
    }

    async fn embed_into_index(
        &self,
        paper_id: i64,
        pdf_path: &Path,
        chunks: Vec<Chunk>,
    ) -> Result<PaperIndex, PaperError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let total = texts.len();
        let batch = self.config.embedding_batch_size.max(1);
        let mut vectors = Vec::with_capacity(total);
        for slice in texts.chunks(batch) {
            vectors.extend(self.embedder.embed_batch(slice).await?);
            self.progress.on_embed_progress(vectors.len(), total);
        }

        let index = PaperIndex::new(
            paper_id,
            pdf_path.to_string_lossy(),
            self.embedder.model_name(),
            chunks,
            vectors,
        )?;
        self.progress.on_index_complete(index.len());
        Ok(index)
    }

    // ── Answering ────────────────────────────────────────────────────────

    pub async fn retrieve(
        &self,
        index: &PaperIndex,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, PaperError> {
        let query_vec = self.embedder.embed(query).await?;
        Ok(index.search(&query_vec, top_k))
    }

    /// Retrieve `top_k` chunks for `query` and answer it from them.
    pub async fn answer(
        &self,
        index: &PaperIndex,
        query: &str,
        generator: &dyn Generator,
    ) -> Result<Answer, PaperError> {
        let sources = self.retrieve(index, query, self.config.top_k).await?;
        let context = prompts::render_context(&sources);
        let prompt = Prompt::new(prompts::QA_SYSTEM_PROMPT, prompts::qa_user_prompt(&context, query));
        let generation = generator.generate(&prompt).await?;
        debug!(
            "{} answered with {} sources ({} output tokens)",
            generator.model_name(),
            sources.len(),
            generation.completion_tokens
        );
        Ok(Answer {
            response: generation.content.trim().to_string(),
            sources,
        })
    }

    /// Evidence-gathering answer: score and summarise `evidence_k` chunks
    /// with `evidence_llm`, keep the best `top_k` relevant ones, and have
    /// `answer_llm` write an answer citing them.
    pub async fn answer_with_citations(
        &self,
        index: &PaperIndex,
        question: &str,
        evidence_llm: Arc<dyn Generator>,
        answer_llm: &dyn Generator,
    ) -> Result<CitedAnswer, PaperError> {
        let hits = self.retrieve(index, question, self.config.evidence_k).await?;
        let mut citations = self
            .gather_evidence(index.paper_id, &hits, question, evidence_llm)
            .await;
        citations.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
        citations.truncate(self.config.top_k);

        let response = if citations.is_empty() {
            CANNOT_ANSWER.to_string()
        } else {
            let evidence: Vec<(String, String)> = citations
                .iter()
                .map(|c| (c.key.clone(), c.text.clone()))
                .collect();
            let prompt = Prompt::new(
                prompts::CITED_SYSTEM_PROMPT,
                prompts::cited_user_prompt(&evidence, question),
            );
            answer_llm.generate(&prompt).await?.content.trim().to_string()
        };

        let formatted_answer = format_answer(question, &response, &citations, &index.pdf_path);
        Ok(CitedAnswer {
            response,
            citations,
            formatted_answer,
        })
    }

    async fn gather_evidence(
        &self,
        paper_id: i64,
        hits: &[SearchHit],
        question: &str,
        evidence_llm: Arc<dyn Generator>,
    ) -> Vec<Citation> {
        let max_retries = self.config.max_retries;
        let jobs: Vec<(usize, Prompt, String)> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let prompt = Prompt::new(
                    prompts::EVIDENCE_SYSTEM_PROMPT,
                    prompts::evidence_user_prompt(&hit.chunk.text, question),
                );
                (i, prompt, citation_key(paper_id, &hit.chunk))
            })
            .collect();

        let results: Vec<Option<Citation>> = stream::iter(jobs.into_iter().map(|(i, prompt, key)| {
            let llm = Arc::clone(&evidence_llm);
            async move {
                match llm.generate(&prompt).await {
                    Ok(g) => match parse_evidence(&g.content) {
                        Some((score, summary)) if score > 0 => Some(Citation {
                            text: summary,
                            score,
                            key,
                        }),
                        _ => {
                            debug!("Evidence {} ({}) judged irrelevant", i, key);
                            None
                        }
                    },
                    Err(e) => {
                        warn!(
                            "Evidence skipped: {}",
                            ItemError::LlmFailed {
                                chunk: i,
                                retries: max_retries,
                                detail: e.to_string(),
                            }
                        );
                        None
                    }
                }
            }
        }))
        .buffer_unordered(self.config.concurrency)
        .collect()
        .await;

        results.into_iter().flatten().collect()
    }
}

/// `paper{id} {pages} #{n}`, with `n` the 1-based chunk number so two
/// chunks on the same pages get distinct keys.
pub fn citation_key(paper_id: i64, chunk: &Chunk) -> String {
    let ordinal = chunk
        .id
        .rsplit('-')
        .next()
        .and_then(|n| n.parse::<usize>().ok())
        .map(|n| (n + 1).to_string())
        .unwrap_or_else(|| chunk.id.clone());
    format!("paper{} {} #{}", paper_id, chunk.pages_label(), ordinal)
}

/// Parse `SCORE: n` / `SUMMARY: ...` from an evidence reply.
///
/// Scores are clamped to 0..=10. The summary runs from `SUMMARY:` to the end
/// of the reply. Returns `None` when either field is missing.
pub fn parse_evidence(reply: &str) -> Option<(u8, String)> {
    let mut score: Option<u8> = None;
    let mut summary: Option<String> = None;
    let mut lines = reply.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim().trim_start_matches(['*', '#', ' ']);
        if let Some(rest) = strip_label(trimmed, "SCORE:") {
            let digits: String = rest.trim_start_matches(['*', ' ']).chars().take_while(|c| c.is_ascii_digit()).collect();
            score = digits.parse::<u32>().ok().map(|n| n.min(10) as u8);
        } else if let Some(rest) = strip_label(trimmed, "SUMMARY:") {
            let mut text = rest.trim_start_matches(['*', ' ']).trim().to_string();
            for more in lines.by_ref() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(more.trim_end());
            }
            summary = Some(text.trim().to_string());
        }
    }
    match (score, summary) {
        (Some(s), Some(text)) if !text.is_empty() => Some((s, text)),
        (Some(0), _) => Some((0, String::new())),
        _ => None,
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    match line.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => Some(&line[label.len()..]),
        _ => None,
    }
}

fn format_answer(question: &str, response: &str, citations: &[Citation], pdf_path: &str) -> String {
    let mut out = format!("Question: {question}\n\n{response}");
    if !citations.is_empty() {
        let source = Path::new(pdf_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf_path.to_string());
        out.push_str("\n\nReferences\n");
        for (i, c) in citations.iter().enumerate() {
            out.push_str(&format!("\n{}. ({}): {}", i + 1, c.key, source));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::llm::Generation;
    use image::{DynamicImage, RgbImage};
    use std::sync::Mutex;

    struct FakeLoader {
        pages: Vec<String>,
        images: usize,
    }

    #[async_trait]
    impl DocumentLoader for FakeLoader {
        async fn load_pages(&self, _pdf_path: &Path) -> Result<Vec<String>, PaperError> {
            Ok(self.pages.clone())
        }

        async fn load_images(&self, _pdf_path: &Path, _min_side: u32) -> Result<Vec<EmbeddedImage>, PaperError> {
            Ok((0..self.images)
                .map(|i| EmbeddedImage {
                    page: i + 1,
                    index: 1,
                    image: DynamicImage::ImageRgb8(RgbImage::new(120, 120)),
                })
                .collect())
        }
    }

    /// Embeds by keyword presence: [cats, dogs, 1].
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PaperError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.matches("cat").count() as f32,
                        t.matches("dog").count() as f32,
                        0.1,
                    ]
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "keyword"
        }
    }

    /// Replies by looking at the user prompt.
    struct ScriptedLlm {
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedLlm {
        async fn generate(&self, prompt: &Prompt) -> Result<Generation, PaperError> {
            self.seen.lock().unwrap().push(prompt.user.clone());
            let content = if !prompt.images.is_empty() {
                "a bar chart".to_string()
            } else if prompt.system == prompts::EVIDENCE_SYSTEM_PROMPT {
                let passage = prompt.user.split("Passage:").nth(1).unwrap_or("");
                if passage.contains("cats") && !passage.contains("dogs") {
                    "SCORE: 8\nSUMMARY: Cats purr.".to_string()
                } else {
                    "SCORE: 0\nSUMMARY: irrelevant".to_string()
                }
            } else {
                "Cats purr (paper1 p. 1 #1).".to_string()
            };
            Ok(Generation {
                content,
                ..Default::default()
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn engine(pages: &[&str], images: usize) -> RagEngine {
        let config = RagConfig::builder()
            .chunk_size(100)
            .chunk_overlap(0)
            .top_k(2)
            .build()
            .unwrap();
        RagEngine::new(
            Arc::new(FakeLoader {
                pages: pages.iter().map(|s| s.to_string()).collect(),
                images,
            }),
            Arc::new(KeywordEmbedder),
            config,
        )
    }

    #[test]
    fn citation_keys_tell_same_page_chunks_apart() {
        let chunk = |id: &str| Chunk {
            id: id.to_string(),
            text: "cats".into(),
            page_start: 3,
            page_end: 3,
            kind: ChunkKind::default(),
        };
        assert_eq!(citation_key(12, &chunk("node-0000")), "paper12 p. 3 #1");
        assert_eq!(citation_key(12, &chunk("node-0004")), "paper12 p. 3 #5");
        assert_eq!(citation_key(12, &chunk("custom")), "paper12 p. 3 #custom");
    }

    #[test]
    fn evidence_parsing() {
        assert_eq!(
            parse_evidence("SCORE: 7\nSUMMARY: Relevant bit."),
            Some((7, "Relevant bit.".into()))
        );
        assert_eq!(
            parse_evidence("**Score:** 12/10\n**Summary:** first\nsecond"),
            Some((10, "first\nsecond".into()))
        );
        assert_eq!(parse_evidence("score: 3\nsummary: x"), Some((3, "x".into())));
        assert_eq!(parse_evidence("SCORE: 0"), Some((0, String::new())));
        assert_eq!(parse_evidence("no structure here"), None);
    }

    #[tokio::test]
    async fn build_index_chunks_and_embeds() {
        let e = engine(&["Cats are small.", "", "Dogs bark loudly."], 0);
        let idx = e.build_index(1, Path::new("/p/paper.pdf")).await.unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.chunks[0].page_start, 1);
        assert_eq!(idx.chunks[0].page_end, 3);
        assert_eq!(idx.embedding_model, "keyword");
    }

    #[tokio::test]
    async fn empty_document_is_no_text() {
        let e = engine(&["", "  \n"], 0);
        let err = e.build_index(1, Path::new("/p/empty.pdf")).await.unwrap_err();
        assert!(matches!(err, PaperError::NoText { .. }));
    }

    #[tokio::test]
    async fn answer_retrieves_relevant_chunk() {
        let long_cats = "cats ".repeat(30);
        let long_dogs = "dogs ".repeat(30);
        let e = engine(&[&long_cats, &long_dogs], 0);
        let idx = e.build_index(1, Path::new("/p/paper.pdf")).await.unwrap();
        assert!(idx.len() >= 2);

        let llm = ScriptedLlm::new();
        let answer = e.answer(&idx, "what about dogs?", &llm).await.unwrap();
        assert!(answer.sources[0].chunk.text.contains("dogs"));
        assert!(llm.seen.lock().unwrap()[0].contains("what about dogs?"));
    }

    #[tokio::test]
    async fn cited_answer_drops_irrelevant_evidence() {
        let long_cats = "cats ".repeat(30);
        let long_dogs = "dogs ".repeat(30);
        let e = engine(&[&long_cats, &long_dogs], 0);
        let idx = e.build_index(1, Path::new("/p/paper.pdf")).await.unwrap();

        let llm = Arc::new(ScriptedLlm::new());
        let cited = e
            .answer_with_citations(&idx, "cats?", llm.clone(), llm.as_ref())
            .await
            .unwrap();
        assert!(!cited.citations.is_empty());
        assert!(cited.citations.iter().all(|c| c.score == 8));
        assert!(cited.citations.iter().all(|c| c.key.starts_with("paper1 p. 1 #")));
        let mut keys: Vec<&str> = cited.citations.iter().map(|c| c.key.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), cited.citations.len(), "keys must be unique: {keys:?}");
        assert_eq!(cited.response, "Cats purr (paper1 p. 1 #1).");
        assert!(cited.formatted_answer.starts_with("Question: cats?"));
        assert!(cited.formatted_answer.contains("References"));
        assert!(cited.formatted_answer.contains("(paper1 p. 1 #1): paper.pdf"));
    }

    #[tokio::test]
    async fn cited_answer_without_evidence_cannot_answer() {
        let e = engine(&["dogs bark"], 0);
        let idx = e.build_index(2, Path::new("/p/paper.pdf")).await.unwrap();
        let llm = Arc::new(ScriptedLlm::new());
        let cited = e
            .answer_with_citations(&idx, "dogs?", llm.clone(), llm.as_ref())
            .await
            .unwrap();
        assert_eq!(cited.response, CANNOT_ANSWER);
        assert!(cited.citations.is_empty());
        assert!(!cited.formatted_answer.contains("References"));
    }

    #[tokio::test]
    async fn multimodal_index_adds_image_chunks() {
        let e = engine(&["Cats are small."], 2);
        let vision: Arc<dyn Generator> = Arc::new(ScriptedLlm::new());
        let idx = e
            .build_multimodal_index(5, Path::new("/p/paper.pdf"), vision)
            .await
            .unwrap();
        let images: Vec<&Chunk> = idx.chunks.iter().filter(|c| c.kind == ChunkKind::Image).collect();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].text, "Figure on page 1: a bar chart");
        assert_eq!(images[1].page_start, 2);
        assert_eq!(images[1].id, "node-0002");
    }
}
