//! Bibliographic metadata sources.
//!
//! This module defines the [`MetadataSource`] trait that turns a
//! [`CanonicalDoi`] into [`PaperMetadata`]. Two network backends are
//! provided, selected through `[resolver] backend` in the configuration:
//!
//! - `doi-org` ([`DoiOrgSource`]): content negotiation at `https://doi.org`
//!   for CSL-JSON. Works for any registration agency that supports CSL
//!   (CrossRef, DataCite, mEDRA).
//! - `crossref` ([`CrossRefSource`]): the CrossRef REST API. Also the only
//!   backend able to search by title.
//!
//! Each call performs exactly one lookup. Retrying is left to the caller.

mod crossref;
mod csl;
mod doi_org;
pub mod mock;

pub use crossref::CrossRefSource;
pub use doi_org::DoiOrgSource;
pub use mock::MockSource;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ResolverBackend, ResolverConfig};
use crate::models::{CanonicalDoi, PaperMetadata};

/// A service that resolves DOIs to paper metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "doi-org", "crossref")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Look up a DOI. The result is all-or-nothing: either every required
    /// field was present, or an error is returned.
    async fn resolve(&self, doi: &CanonicalDoi) -> Result<PaperMetadata, ResolutionError>;

    /// Whether [`search_by_title`](Self::search_by_title) is backed by a real query
    fn supports_title_search(&self) -> bool {
        false
    }

    /// Find the DOI of the best bibliographic match for a title
    async fn search_by_title(&self, _title: &str) -> Result<Option<CanonicalDoi>, ResolutionError> {
        Ok(None)
    }
}

/// Errors that can occur when resolving a DOI
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The service has no record for this DOI
    #[error("DOI not found: {0}")]
    NotFound(String),

    /// The service could not be reached or answered with a server error
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The response did not contain a usable record
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ResolutionError {
    /// `NotFound` is final for a DOI; the other kinds may succeed on a later run.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ResolutionError::NotFound(_))
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionError::NotFound(_) => "not_found",
            ResolutionError::NetworkUnavailable(_) => "network_unavailable",
            ResolutionError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for ResolutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ResolutionError::MalformedResponse(err.to_string())
        } else {
            ResolutionError::NetworkUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolutionError {
    fn from(err: serde_json::Error) -> Self {
        ResolutionError::MalformedResponse(format!("JSON: {}", err))
    }
}

/// Build the configured metadata source
pub fn from_config(config: &ResolverConfig) -> Result<Arc<dyn MetadataSource>, ResolutionError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mailto = config.mailto.as_deref().filter(|m| !m.is_empty());

    Ok(match config.backend {
        ResolverBackend::DoiOrg => Arc::new(DoiOrgSource::new(timeout, mailto)?),
        ResolverBackend::CrossRef => Arc::new(CrossRefSource::new(timeout, mailto)?),
    })
}

/// User agent sent to metadata services, with an optional contact address
pub(crate) fn user_agent(mailto: Option<&str>) -> String {
    match mailto {
        Some(mail) => format!(
            "{}/{} (mailto:{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            mail
        ),
        None => format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    }
}
