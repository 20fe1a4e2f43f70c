//! Document access: open a PDF and read its text layer and metadata.

use crate::error::PaperError;
use crate::pdf::pdfium;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Basic document facts read from the PDF info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: usize,
}

/// Open `pdf_path` with `pdfium`, mapping load failures to [`PaperError`].
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PaperError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let detail = format!("{:?}", e);
        if detail.contains("Password") || detail.contains("password") {
            PaperError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        } else {
            PaperError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail,
            }
        }
    })
}

/// Read the text of the first `max_pages` pages (all pages when `None`).
///
/// Runs on the blocking pool; the returned vector holds one entry per page,
/// in page order, possibly empty for image-only pages.
pub async fn extract_page_texts(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<Vec<String>, PaperError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_page_texts_blocking(&path, max_pages))
        .await
        .map_err(|e| PaperError::Internal(format!("Text task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_page_texts`].
pub fn extract_page_texts_blocking(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<Vec<String>, PaperError> {
    let pdfium = pdfium::bind()?;
    let document = open_document(&pdfium, pdf_path, None)?;
    let pages = document.pages();
    let total = pages.len() as usize;
    let limit = max_pages.map_or(total, |m| m.min(total));
    info!("PDF loaded: {} pages, reading text from {}", total, limit);

    let mut texts = Vec::with_capacity(limit);
    for (idx, page) in pages.iter().take(limit).enumerate() {
        let text = page
            .text()
            .map(|t| t.all())
            .map_err(|e| PaperError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
        debug!("Page {}: {} chars of text", idx + 1, text.len());
        texts.push(text);
    }
    Ok(texts)
}

/// Read title, author and page count without touching page content.
pub async fn document_info(pdf_path: &Path) -> Result<DocumentInfo, PaperError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = pdfium::bind()?;
        let document = open_document(&pdfium, &path, None)?;
        let metadata = document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata
                .get(tag)
                .map(|t| t.value().trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Ok(DocumentInfo {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            page_count: document.pages().len() as usize,
        })
    })
    .await
    .map_err(|e| PaperError::Internal(format!("Metadata task panicked: {}", e)))?
}
