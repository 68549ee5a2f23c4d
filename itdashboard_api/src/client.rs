//! HTTP client for the itdashboard.gov ITDB2 API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use url::Url;

use crate::{Error, Page};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client for the ITDB2 API.
///
/// Sends requests with browser-like headers and a shared cookie jar, so
/// cookies picked up during [`Client::bootstrap`] ride along on every later
/// request. Each request builds a fresh `reqwest::Client` with a 30-second
/// timeout; only the jar is shared. One network call per method invocation;
/// any non-200 status is an error.
pub struct Client {
    /// Session cookies, shared by all requests.
    jar: Arc<Jar>,
    /// Base URL for API endpoints. Defaults to `{home}/api/v1/ITDB2`.
    base_api_url: String,
    /// Site root, used for bootstrap and referer construction.
    home_url: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production dashboard.
    pub fn new() -> Self {
        let home = "https://itdashboard.gov".to_string();
        let base = format!("{}/api/v1/ITDB2", home);
        Self::with_base_urls(&base, &home)
    }

    /// Creates a new client with custom base/home URLs. Used for testing with wiremock.
    pub fn with_base_urls(base_api_url: &str, home_url: &str) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            base_api_url: base_api_url.to_string(),
            home_url: home_url.to_string(),
        }
    }

    /// URL of the government-wide agency tiles endpoint.
    pub fn agency_tiles_url(&self) -> String {
        format!("{}/visualization/govwide/agencyTiles", self.base_api_url)
    }

    /// URL of the investments table endpoint for one agency.
    pub fn investments_url(&self, code: &str) -> String {
        format!(
            "{}/visualization/agency/investmentsTable/agencyCode/{}?full=1",
            self.base_api_url, code
        )
    }

    /// URL of the generated business-case PDF for one investment.
    pub fn business_case_pdf_url(&self, uii: &str) -> String {
        format!("{}/businesscase/pdf/generate/uii/{}", self.base_api_url, uii)
    }

    /// Visits the site root to load session cookies.
    ///
    /// Must be called exactly once, before any data request. The dashboard
    /// rejects API calls from sessions that never touched the home page.
    pub async fn bootstrap(&self) -> Result<(), Error> {
        let url = format!("{}/", self.home_url);
        self.send(&url, None).await?;
        Ok(())
    }

    /// Fetches a JSON document. Exactly one network call.
    pub async fn get_json(&self, url: &str, page: &Page<'_>) -> Result<serde_json::Value, Error> {
        let resp = self.send(url, Some(page)).await?;
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;
        let parsed = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse resource: {} | body: {}", e, truncate_body(&body));
            Error::RequestFailed
        })?;
        Ok(parsed)
    }

    /// Fetches a binary document (PDF). Exactly one network call.
    pub async fn get_bytes(&self, url: &str, page: &Page<'_>) -> Result<Vec<u8>, Error> {
        let resp = self.send(url, Some(page)).await?;
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, url: &str, page: Option<&Page<'_>>) -> Result<reqwest::Response, Error> {
        let url = Url::parse(url).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&self.jar))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let mut req = client
            .get(url.clone())
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "en-US,en;q=0.9");
        if let Some(page) = page {
            req = req.header("referer", page.referer(&self.home_url));
        }
        let resp = req.send().await.map_err(|e| {
            tracing::error!("Failed to get resource: {}", e);
            Error::RequestFailed
        })?;

        let status = resp.status();
        tracing::info!("GET {} -> {}", url, status.as_u16());
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }
        Ok(resp)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    // Cut on a char boundary; a multibyte body must not panic the error path.
    let cut = body
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= MAX)
        .last()
        .unwrap_or(0);
    format!("{}...[truncated]", &body[..cut])
}
