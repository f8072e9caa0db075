//! CrossRef research source implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::csl::CslItem;
use super::{user_agent, MetadataSource, ResolutionError};
use crate::identifiers::normalize_doi;
use crate::models::{CanonicalDoi, PaperMetadata};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef research source
///
/// Uses CrossRef REST API for DOI metadata lookup and title search.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(timeout: Duration, mailto: Option<&str>) -> Result<Self, ResolutionError> {
        Self::with_base_url(CROSSREF_API_BASE, timeout, mailto)
    }

    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        mailto: Option<&str>,
    ) -> Result<Self, ResolutionError> {
        let client = HttpClient::with_user_agent(&user_agent(mailto), timeout)?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataSource for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn resolve(&self, doi: &CanonicalDoi) -> Result<PaperMetadata, ResolutionError> {
        let url = format!("{}/works/{}", self.base_url, doi.url_path());
        tracing::debug!(%url, "Resolving DOI");

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResolutionError::NotFound(doi.to_string()));
        }
        if !response.status().is_success() {
            return Err(ResolutionError::NetworkUnavailable(format!(
                "CrossRef API returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let data: CRWork = serde_json::from_str(&body)?;
        data.message.into_metadata()
    }

    fn supports_title_search(&self) -> bool {
        true
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<CanonicalDoi>, ResolutionError> {
        let url = format!(
            "{}/works?query.bibliographic={}&rows=1&select=DOI,title",
            self.base_url,
            urlencoding::encode(title)
        );
        tracing::debug!(%title, "Searching CrossRef by title");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ResolutionError::NetworkUnavailable(format!(
                "CrossRef API returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let data: CRSearch = serde_json::from_str(&body)?;

        Ok(data
            .message
            .items
            .into_iter()
            .next()
            .and_then(|item| item.doi)
            .and_then(|doi| normalize_doi(&doi).ok()))
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRWork {
    message: CslItem,
}

#[derive(Debug, Deserialize)]
struct CRSearch {
    message: CRSearchMessage,
}

#[derive(Debug, Deserialize)]
struct CRSearchMessage {
    #[serde(default)]
    items: Vec<CRSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CRSearchItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}
