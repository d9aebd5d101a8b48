//! Retrieves the floorplans page

use std::sync::Arc;

use crate::error::TransportError;
use crate::io::HttpClient;

/// Fetches one URL; retries are left to the schedule
pub struct PageFetcher {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("url", &self.url)
            .finish()
    }
}

impl PageFetcher {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let url = url.into();
        tracing::debug!("Created PageFetcher for {}", url);
        Self { url, http }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Page body, or a transport error for network failures, timeouts and non-2xx statuses
    pub async fn fetch(&self) -> crate::Result<String> {
        tracing::debug!("Fetching {}", self.url);
        let response = self.http.get(&self.url).await?;

        if !response.is_success() {
            return Err(TransportError::Status {
                url: self.url.clone(),
                status: response.status,
            }
            .into());
        }

        tracing::debug!("Fetched {} ({} bytes)", self.url, response.body.len());
        Ok(response.body)
    }
}
