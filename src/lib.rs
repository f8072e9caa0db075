//! # paper-rename
//!
//! Renames academic-paper PDFs to `[Year]+[Venue]--Title.pdf` by finding a
//! DOI in the document text, resolving it to bibliographic metadata, and
//! mapping the venue to a curated acronym.
//!
//! ## Architecture
//!
//! - [`identifiers`]: DOI location across publisher formats and normalization
//! - [`sources`]: metadata services behind the [`MetadataSource`](sources::MetadataSource) trait
//! - [`venue`]: venue name normalization and the persisted acronym map
//! - [`naming`]: fallback titles, filename sanitization and collision handling
//! - [`pipeline`]: per-file control flow and batch runs
//! - [`models`]: shared data types
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client and PDF text extraction

pub mod config;
pub mod identifiers;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;
pub mod venue;

// Re-export commonly used types
pub use models::{BatchReport, CanonicalDoi, FileOutcome, PaperMetadata};
pub use pipeline::Pipeline;
pub use sources::MetadataSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
