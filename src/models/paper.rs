//! Paper metadata resolved from a DOI, and the rename plan built from it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bibliographic metadata for one paper.
///
/// Only a [`MetadataSource`](crate::sources::MetadataSource) produces this
/// record, and it is never partially filled: a response that lacks the
/// title or the author list is rejected before a `PaperMetadata` exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Paper title
    pub title: String,

    /// Authors in publication order ("Given Family" or a literal name)
    pub authors: Vec<String>,

    /// Publication year
    pub year: Option<i32>,

    /// Full name of the conference or journal
    pub venue_full_name: Option<String>,
}

impl PaperMetadata {
    /// Create metadata with a title and author list
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            title: title.into(),
            authors,
            year: None,
            venue_full_name: None,
        }
    }

    /// Set the publication year
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the venue full name
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.venue_full_name = Some(venue.into());
        self
    }
}

/// Everything needed to compute a target filename for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    /// Publication year, absent on the fallback path
    pub year: Option<i32>,

    /// Venue acronym (or full name), absent on the fallback path
    pub venue_tag: Option<String>,

    /// Unsanitized title
    pub title: String,

    /// File being renamed
    pub source_path: PathBuf,
}

impl RenamePlan {
    /// Plan for a paper whose metadata was resolved
    pub fn resolved(
        source_path: impl Into<PathBuf>,
        year: Option<i32>,
        venue_tag: Option<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            year,
            venue_tag,
            title: title.into(),
            source_path: source_path.into(),
        }
    }

    /// Plan for the fallback path: title only, year and venue left blank
    pub fn fallback(source_path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            year: None,
            venue_tag: None,
            title: title.into(),
            source_path: source_path.into(),
        }
    }

    /// Whether this plan carries any resolved metadata
    pub fn is_fallback(&self) -> bool {
        self.year.is_none() && self.venue_tag.is_none()
    }
}
