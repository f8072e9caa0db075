//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{CanonicalDoi, PaperMetadata};
use crate::sources::{MetadataSource, ResolutionError};

#[derive(Debug, Default)]
struct MockState {
    records: HashMap<String, Result<PaperMetadata, ResolutionError>>,
    title_hits: HashMap<String, CanonicalDoi>,
    calls: Vec<String>,
}

/// A mock source for testing that returns predefined responses.
///
/// DOIs without a configured response resolve to `NotFound`.
#[derive(Debug, Default)]
pub struct MockSource {
    state: Mutex<MockState>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `metadata` for `doi`.
    pub fn insert(&self, doi: &str, metadata: PaperMetadata) {
        self.state().records.insert(doi.to_string(), Ok(metadata));
    }

    /// Fail lookups of `doi` with `error`.
    pub fn insert_error(&self, doi: &str, error: ResolutionError) {
        self.state().records.insert(doi.to_string(), Err(error));
    }

    /// Answer a title search for `title` with `doi`.
    pub fn insert_title_hit(&self, title: &str, doi: CanonicalDoi) {
        self.state()
            .title_hits
            .insert(title.to_lowercase(), doi);
    }

    /// DOIs passed to `resolve`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl MetadataSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn resolve(&self, doi: &CanonicalDoi) -> Result<PaperMetadata, ResolutionError> {
        let mut state = self.state();
        state.calls.push(doi.to_string());
        state
            .records
            .get(doi.as_str())
            .cloned()
            .unwrap_or_else(|| Err(ResolutionError::NotFound(doi.to_string())))
    }

    fn supports_title_search(&self) -> bool {
        true
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<CanonicalDoi>, ResolutionError> {
        Ok(self.state().title_hits.get(&title.to_lowercase()).cloned())
    }
}

/// Helper function to create mock metadata for testing.
pub fn make_metadata(title: &str, year: i32, venue: &str) -> PaperMetadata {
    PaperMetadata::new(title, vec!["Test Author".to_string()])
        .year(year)
        .venue(venue)
}
