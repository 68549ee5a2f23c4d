//! Caching and rate-limiting wrapper around the API client.

use std::path::PathBuf;
use std::time::Duration;

use itdashboard_api::types::{Agency, Investment, ResultEnvelope};
use itdashboard_api::{Client, Page};

use crate::cache::DiskCache;
use crate::error::SnapshotError;

/// API client wrapper that adds the disk cache and a fixed inter-request
/// delay.
///
/// Cache hits bypass the network (and the delay) entirely. On cache misses
/// the configured pause is taken before every HTTP request, including the
/// session bootstrap. The dataset is assumed all-or-nothing per run, so any
/// request failure propagates and aborts the caller.
pub struct SnapshotClient {
    inner: Client,
    cache: DiskCache,
    delay: Duration,
}

impl SnapshotClient {
    /// Creates a client against the production dashboard.
    pub fn new(cache: DiskCache, delay: Duration) -> Self {
        Self {
            inner: Client::new(),
            cache,
            delay,
        }
    }

    /// Creates a client with custom base/home URLs. Used for testing.
    pub fn with_base_urls(
        base_api_url: &str,
        home_url: &str,
        cache: DiskCache,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Client::with_base_urls(base_api_url, home_url),
            cache,
            delay,
        }
    }

    /// Fixed pause taken before every network call.
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }

    /// Loads session cookies by visiting the site root. Call once, before
    /// any fetch.
    pub async fn bootstrap(&self) -> Result<(), SnapshotError> {
        self.pause().await;
        self.inner.bootstrap().await?;
        Ok(())
    }

    /// The full agency list, cache-backed.
    pub async fn agencies(&self) -> Result<Vec<Agency>, SnapshotError> {
        let url = self.inner.agency_tiles_url();
        let url = url.as_str();
        let value = self
            .cache
            .get_or_fetch_json(url, move || async move {
                self.pause().await;
                Ok(self.inner.get_json(url, &Page::Govwide).await?)
            })
            .await?;
        let envelope: ResultEnvelope<Agency> = serde_json::from_value(value)?;
        Ok(envelope.result)
    }

    /// One agency's investments table, cache-backed.
    pub async fn investments(&self, code: &str) -> Result<Vec<Investment>, SnapshotError> {
        let url = self.inner.investments_url(code);
        let url = url.as_str();
        let value = self
            .cache
            .get_or_fetch_json(url, move || async move {
                self.pause().await;
                Ok(self
                    .inner
                    .get_json(url, &Page::AgencySummary { code })
                    .await?)
            })
            .await?;
        let envelope: ResultEnvelope<Investment> = serde_json::from_value(value)?;
        Ok(envelope.result)
    }

    /// The business-case PDF for one investment, cache-backed. Returns the
    /// on-disk path of the artifact.
    pub async fn business_case_pdf(
        &self,
        code: &str,
        uii: &str,
    ) -> Result<PathBuf, SnapshotError> {
        let url = self.inner.business_case_pdf_url(uii);
        let url = url.as_str();
        self.cache
            .get_or_fetch_pdf(url, move || async move {
                self.pause().await;
                Ok(self
                    .inner
                    .get_bytes(url, &Page::BusinessCase { code, uii })
                    .await?)
            })
            .await
    }
}
