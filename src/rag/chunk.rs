//! Split cleaned page texts into overlapping retrieval chunks.
//!
//! Pages are concatenated (separated by a blank line) and cut into windows
//! of `chunk_size` characters. A window is shortened to the last whitespace
//! in its second half so words are not cut, and the next window starts
//! `chunk_overlap` characters before the previous end. Each chunk records
//! the first and last page its characters came from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Text from the PDF text layer.
    #[default]
    Text,
    /// A vision-model description of an embedded image.
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    /// 1-indexed first page.
    pub page_start: usize,
    /// 1-indexed last page, inclusive.
    pub page_end: usize,
    #[serde(default)]
    pub kind: ChunkKind,
}

impl Chunk {
    /// Human-readable page span: `p. 3` or `pp. 3-4`.
    pub fn pages_label(&self) -> String {
        if self.page_start == self.page_end {
            format!("p. {}", self.page_start)
        } else {
            format!("pp. {}-{}", self.page_start, self.page_end)
        }
    }
}

const PAGE_JOIN: &str = "\n\n";

/// Chunk `pages` (index 0 = page 1). Empty pages contribute nothing.
///
/// Chunk ids are `node-0000`, `node-0001`, … in document order, starting at
/// `first_id`.
pub fn chunk_pages(
    pages: &[String],
    chunk_size: usize,
    chunk_overlap: usize,
    first_id: usize,
) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let overlap = chunk_overlap.min(chunk_size - 1);

    // Flatten to characters tagged with their page number.
    let mut chars: Vec<char> = Vec::new();
    let mut page_of: Vec<usize> = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        if !chars.is_empty() {
            for c in PAGE_JOIN.chars() {
                chars.push(c);
                page_of.push(idx + 1);
            }
        }
        for c in page.chars() {
            chars.push(c);
            page_of.push(idx + 1);
        }
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end < chars.len() {
            soft_break(&chars, start, hard_end)
        } else {
            hard_end
        };

        let text: String = chars[start..end].iter().collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            // Span from first to last non-whitespace character.
            let first = (start..end).find(|&i| !chars[i].is_whitespace()).unwrap_or(start);
            let last = (start..end)
                .rev()
                .find(|&i| !chars[i].is_whitespace())
                .unwrap_or(end - 1);
            chunks.push(Chunk {
                id: format!("node-{:04}", first_id + chunks.len()),
                text: trimmed.to_string(),
                page_start: page_of[first],
                page_end: page_of[last],
                kind: ChunkKind::Text,
            });
        }

        if end >= chars.len() {
            break;
        }
        let next = end.saturating_sub(overlap);
        // Always make progress, and start the overlap on a word boundary.
        start = if next <= start {
            end
        } else {
            align_to_word(&chars, next, end)
        };
    }
    chunks
}

/// Last whitespace position in the second half of `[start, hard_end)`, or
/// `hard_end` when there is none.
fn soft_break(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;
    (floor..hard_end)
        .rev()
        .find(|&i| chars[i].is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(hard_end)
}

/// Move `pos` forward to the start of the next word, never past `limit`.
fn align_to_word(chars: &[char], pos: usize, limit: usize) -> usize {
    if pos == 0 || chars[pos - 1].is_whitespace() {
        return pos;
    }
    (pos..limit)
        .find(|&i| chars[i].is_whitespace())
        .map(|i| i + 1)
        .filter(|&i| i < limit)
        .unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, prefix: &str) -> String {
        (0..n)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_document_is_one_chunk() {
        let pages = vec!["Hello world.".to_string()];
        let chunks = chunk_pages(&pages, 100, 10, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world.");
        assert_eq!(chunks[0].id, "node-0000");
        assert_eq!((chunks[0].page_start, chunks[0].page_end), (1, 1));
    }

    #[test]
    fn chunks_respect_size_and_word_boundaries() {
        let pages = vec![words(200, "w")];
        let chunks = chunk_pages(&pages, 120, 30, 0);
        assert!(chunks.len() > 3);
        for c in &chunks {
            assert!(c.text.chars().count() <= 120, "chunk too long: {}", c.text.len());
            // No word is cut in half.
            for w in c.text.split_whitespace() {
                assert!(w.starts_with('w') && w[1..].parse::<usize>().is_ok(), "cut word {w}");
            }
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let pages = vec![words(200, "w")];
        let chunks = chunk_pages(&pages, 120, 30, 0);
        for pair in chunks.windows(2) {
            let last_word = pair[0].text.split_whitespace().last().unwrap();
            assert!(
                pair[1].text.contains(last_word),
                "expected '{last_word}' to be repeated in the next chunk"
            );
        }
    }

    #[test]
    fn page_spans_are_tracked() {
        let pages = vec![words(30, "a"), String::new(), words(30, "c")];
        let chunks = chunk_pages(&pages, 4000, 0, 7);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "node-0007");
        assert_eq!((chunks[0].page_start, chunks[0].page_end), (1, 3));
        assert_eq!(chunks[0].pages_label(), "pp. 1-3");

        let small = chunk_pages(&pages, 150, 0, 0);
        assert_eq!(small.first().unwrap().page_start, 1);
        assert_eq!(small.last().unwrap().page_end, 3);
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(chunk_pages(&[], 100, 10, 0).is_empty());
        assert!(chunk_pages(&["   \n ".to_string()], 100, 10, 0).is_empty());
    }

    #[test]
    fn unbroken_text_is_hard_split() {
        let pages = vec!["x".repeat(250)];
        let chunks = chunk_pages(&pages, 100, 20, 0);
        assert_eq!(chunks[0].text.len(), 100);
        assert!(chunks.iter().all(|c| c.text.len() <= 100));
        let total: usize = chunks.iter().map(|c| c.text.len()).sum();
        assert!(total >= 250);
    }
}
