//! DOI discovery and bibliographic lookup.
//!
//! [`find`] scans the first pages of a paper for something that looks like
//! a DOI; [`crossref`] resolves it to title, authors, date and venue.

pub mod crossref;
pub mod find;

pub use crossref::{CrossRefClient, DoiMetadata};
pub use find::{find_doi, validate_doi};

use crate::error::PaperError;
use crate::pdf;
use std::path::Path;

/// Pages searched for a DOI. Title pages and first-page footers carry it.
pub const DOI_SEARCH_PAGES: usize = 3;

/// Read the first pages of `pdf_path` and return the first valid DOI.
pub async fn doi_from_pdf(pdf_path: &Path) -> Result<String, PaperError> {
    let texts = pdf::extract_page_texts(pdf_path, Some(DOI_SEARCH_PAGES)).await?;
    let text = texts.concat();
    if text.trim().is_empty() {
        return Err(PaperError::NoText {
            path: pdf_path.to_path_buf(),
        });
    }
    find_doi(&text).ok_or_else(|| PaperError::DoiNotFound {
        path: pdf_path.to_path_buf(),
    })
}
