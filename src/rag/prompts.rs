//! Prompts for question answering, evidence gathering and image captions.
//!
//! Keeping every prompt here means wording changes touch one file and unit
//! tests can inspect the rendered text without calling a model.

use crate::rag::index::SearchHit;

/// System prompt for answering from retrieved context.
pub const QA_SYSTEM_PROMPT: &str = r#"You are a research assistant answering questions about a single scientific paper.

Rules:
- Answer ONLY from the context passages provided.
- If the context does not contain the answer, say that the paper does not cover it.
- Be concise and precise; quote numbers and names exactly as they appear.
- Do not invent references, figures or results."#;

/// System prompt for the citation backend's final answer.
pub const CITED_SYSTEM_PROMPT: &str = r#"You are a research assistant writing a short, well-sourced answer about a scientific paper.

Rules:
- Use ONLY the evidence summaries provided.
- After each claim, cite the supporting evidence key in parentheses, e.g. (paper12 pp. 3-4 #7).
- If the evidence is insufficient, reply exactly: I cannot answer.
- Do not cite keys that were not provided."#;

/// System prompt for scoring a single passage.
pub const EVIDENCE_SYSTEM_PROMPT: &str = r#"You extract evidence from a passage of a scientific paper.

Reply in exactly this format:
SCORE: <integer 0-10, how relevant the passage is to the question>
SUMMARY: <at most 3 sentences summarising the part of the passage relevant to the question>

Use SCORE: 0 when the passage is irrelevant."#;

/// System prompt for describing an embedded figure.
pub const CAPTION_SYSTEM_PROMPT: &str = r#"You describe figures extracted from scientific papers so they can be found by text search.

Describe what the image shows: chart type, axes, legends, trends, labelled values, diagram components or table contents.
Write plain prose in at most 120 words. Do not speculate beyond what is visible."#;

/// User turn for a plain retrieval answer.
pub fn qa_user_prompt(context: &str, question: &str) -> String {
    format!("Context passages:\n\n{context}\n\n---\n\n{question}")
}

/// Render hits as numbered, page-labelled passages.
pub fn render_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("[{}] ({})\n{}", i + 1, h.chunk.pages_label(), h.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User turn for scoring one passage.
pub fn evidence_user_prompt(passage: &str, question: &str) -> String {
    format!("Question: {question}\n\nPassage:\n\"\"\"{passage}\"\"\"")
}

/// User turn for the cited answer; `evidence` is `(key, summary)` pairs.
pub fn cited_user_prompt(evidence: &[(String, String)], question: &str) -> String {
    let body = evidence
        .iter()
        .map(|(key, summary)| format!("{key}: {summary}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Evidence:\n\n{body}\n\nQuestion: {question}")
}

/// User turn for an image caption.
pub fn caption_user_prompt(page: usize) -> String {
    format!("This figure appears on page {page} of the paper. Describe it.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunk::{Chunk, ChunkKind};

    #[test]
    fn context_is_numbered_with_pages() {
        let hits = vec![
            SearchHit {
                chunk: Chunk {
                    id: "node-0000".into(),
                    text: "alpha".into(),
                    page_start: 1,
                    page_end: 1,
                    kind: ChunkKind::Text,
                },
                score: 0.9,
            },
            SearchHit {
                chunk: Chunk {
                    id: "node-0001".into(),
                    text: "beta".into(),
                    page_start: 2,
                    page_end: 3,
                    kind: ChunkKind::Text,
                },
                score: 0.5,
            },
        ];
        assert_eq!(render_context(&hits), "[1] (p. 1)\nalpha\n\n[2] (pp. 2-3)\nbeta");
    }

    #[test]
    fn cited_prompt_lists_keys() {
        let p = cited_user_prompt(
            &[("paper1 p. 2 #3".into(), "uses transformers".into())],
            "What model?",
        );
        assert!(p.contains("paper1 p. 2 #3: uses transformers"));
        assert!(p.ends_with("Question: What model?"));
    }
}
