//! PDF text extraction utilities.
//!
//! Identifiers live on the first page or two, so [`PdfTextExtractor`] reads
//! only the leading pages with `lopdf`. Documents `lopdf` cannot decode, or
//! whose leading pages yield no text, are retried with `pdf-extract` over
//! the whole file.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("File not found or not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of raw text for one file.
///
/// An `Ok` result may be empty (scanned documents); only unreadable files
/// are errors.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, PdfExtractError>;
}

/// Default number of leading pages searched
pub const DEFAULT_MAX_PAGES: usize = 3;

/// Extracts text from the first `max_pages` pages of a PDF.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    max_pages: usize,
}

impl PdfTextExtractor {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    fn leading_pages(&self, path: &Path) -> Result<String, PdfExtractError> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().take(self.max_pages).collect();
        if pages.is_empty() {
            return Ok(String::new());
        }
        doc.extract_text(&pages)
            .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))
    }

    fn whole_document(path: &Path) -> Result<String, PdfExtractError> {
        // pdf-extract panics on some malformed inputs
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PdfExtractError::ExtractionFailed(e.to_string())),
            Err(_) => Err(PdfExtractError::ExtractionFailed(
                "PDF parser aborted".to_string(),
            )),
        }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, PdfExtractError> {
        if !path.exists() {
            return Err(PdfExtractError::InvalidFile(format!(
                "File not found: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(PdfExtractError::InvalidFile(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        match self.leading_pages(path) {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {
                tracing::debug!(path = %path.display(), "No text on leading pages, reading whole document");
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "lopdf failed, retrying with pdf-extract");
            }
        }

        let text = Self::whole_document(path)?;
        if text.trim().is_empty() {
            // Scanned or image-only PDF
            tracing::debug!("Extracted empty text from PDF: {}", path.display());
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extract_nonexistent_file() {
        let result = PdfTextExtractor::default().extract(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(PdfExtractError::InvalidFile(_))));
    }

    #[test]
    fn test_extract_directory() {
        let dir = tempdir().unwrap();
        let result = PdfTextExtractor::default().extract(dir.path());
        assert!(matches!(result, Err(PdfExtractError::InvalidFile(_))));
    }

    #[test]
    fn test_extract_garbage_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let result = PdfTextExtractor::new(2).extract(&path);
        assert!(matches!(result, Err(PdfExtractError::ExtractionFailed(_))));
    }

    #[test]
    fn test_max_pages_at_least_one() {
        assert_eq!(PdfTextExtractor::new(0).max_pages, 1);
    }
}
