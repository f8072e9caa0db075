//! doi.org content-negotiation source.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use super::csl::CslItem;
use super::{user_agent, MetadataSource, ResolutionError};
use crate::models::{CanonicalDoi, PaperMetadata};
use crate::utils::HttpClient;

const DOI_ORG_BASE: &str = "https://doi.org";
const CSL_JSON: &str = "application/vnd.citationstyles.csl+json";

/// Resolves DOIs through doi.org, asking the registration agency for CSL-JSON.
#[derive(Debug, Clone)]
pub struct DoiOrgSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl DoiOrgSource {
    pub fn new(timeout: Duration, mailto: Option<&str>) -> Result<Self, ResolutionError> {
        Self::with_base_url(DOI_ORG_BASE, timeout, mailto)
    }

    /// Point the source at another resolver (used by tests)
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
impl MetadataSource for DoiOrgSource {
    fn id(&self) -> &str {
        "doi-org"
    }

    fn name(&self) -> &str {
        "doi.org"
    }

    async fn resolve(&self, doi: &CanonicalDoi) -> Result<PaperMetadata, ResolutionError> {
        let url = format!("{}/{}", self.base_url, doi.url_path());
        tracing::debug!(%url, "Resolving DOI");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, CSL_JSON)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                return Err(ResolutionError::NotFound(doi.to_string()));
            }
            StatusCode::NOT_ACCEPTABLE => {
                return Err(ResolutionError::MalformedResponse(format!(
                    "no CSL-JSON available for {}",
                    doi
                )));
            }
            status if !status.is_success() => {
                return Err(ResolutionError::NetworkUnavailable(format!(
                    "doi.org returned status: {}",
                    status
                )));
            }
            _ => {}
        }

        let body = response.text().await?;
        let item: CslItem = serde_json::from_str(&body)?;
        item.into_metadata()
    }
}
