//! PDF page-text extraction.

use std::path::Path;

use lopdf::Document;
use tracing::debug;

use docrag_core::{RagError, Result};

/// Extract the text of every page in document order, dropping pages with no
/// visible text.
///
/// # Errors
///
/// Returns [`RagError::PdfLoad`] when the file cannot be parsed or when no
/// page yields any extractable text.
pub fn load_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let document = Document::load(path).map_err(|e| RagError::PdfLoad {
        path: path.to_path_buf(),
        message: format!("failed to open PDF: {e}"),
    })?;

    let mut pages = Vec::new();
    for (page_number, _) in document.get_pages() {
        match document.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(text),
            Ok(_) => debug!(page = page_number, "page has no text"),
            Err(e) => debug!(page = page_number, error = %e, "page text not extractable"),
        }
    }

    if pages.is_empty() {
        return Err(RagError::PdfLoad {
            path: path.to_path_buf(),
            message: "no extractable text in any page".into(),
        });
    }

    debug!(path = %path.display(), pages = pages.len(), "extracted page texts");
    Ok(pages)
}
