//! Utility modules supporting the rename pipeline.
//!
//! - [`HttpClient`]: shared reqwest client used by the metadata sources
//! - [`TextExtractor`]: pulls raw text out of a file
//! - [`PdfTextExtractor`]: `TextExtractor` for PDFs, leading pages first
//! - [`PdfExtractError`]: errors that can occur during PDF extraction
//!
//! ```rust,no_run
//! use paper_rename::utils::{PdfTextExtractor, TextExtractor};
//! use std::path::Path;
//!
//! let text = PdfTextExtractor::new(2).extract(Path::new("paper.pdf"))?;
//! println!("Extracted {} characters", text.len());
//! # Ok::<(), paper_rename::utils::PdfExtractError>(())
//! ```

mod http;
mod pdf;

pub use http::HttpClient;
pub use pdf::{PdfExtractError, PdfTextExtractor, TextExtractor, DEFAULT_MAX_PAGES};
