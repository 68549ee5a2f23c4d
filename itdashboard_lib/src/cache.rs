//! Read-through disk cache for fetched artifacts.
//!
//! Every API response is persisted under the output folder, keyed by the
//! trailing path segments of the request URL. Once a key is on disk a
//! second request for the same URL never touches the network, unless the
//! force-reload flag is set.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SnapshotError;

/// The two kinds of artifact the cache persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Json,
    Pdf,
}

impl ArtifactKind {
    /// How many trailing URL path segments make up the cache key.
    ///
    /// Last-N semantics keep distinct resources (different agency codes,
    /// different UIIs) on distinct files while ignoring the volatile host
    /// and version prefix.
    fn key_segments(self) -> usize {
        match self {
            ArtifactKind::Json => 4,
            ArtifactKind::Pdf => 3,
        }
    }

    fn subdir(self) -> &'static str {
        match self {
            ArtifactKind::Json => "json",
            ArtifactKind::Pdf => "pdf",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Json => "json",
            ArtifactKind::Pdf => "pdf",
        }
    }
}

/// Derives the cache key for a URL: query string dropped, last N path
/// segments joined with `_`. Pure function of the URL.
pub fn cache_key(url: &str, kind: ArtifactKind) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let segments: Vec<&str> = without_query.split('/').collect();
    let n = kind.key_segments().min(segments.len());
    segments[segments.len() - n..].join("_")
}

/// Disk-backed read-through cache rooted at the output folder.
pub struct DiskCache {
    root: PathBuf,
    /// When set, cache hits are ignored and every read refetches.
    reload: bool,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>, reload: bool) -> Self {
        Self {
            root: root.into(),
            reload,
        }
    }

    /// The on-disk location an artifact for `url` lives at.
    pub fn artifact_path(&self, url: &str, kind: ArtifactKind) -> PathBuf {
        let key = cache_key(url, kind);
        self.root
            .join(kind.subdir())
            .join(format!("{}.{}", key, kind.extension()))
    }

    /// Returns the cached JSON document for `url`, fetching and persisting
    /// it first on a miss (or whenever force-reload is set).
    ///
    /// Stored pretty-printed; `serde_json` objects keep keys sorted, so the
    /// files are stable across runs.
    pub async fn get_or_fetch_json<F, Fut>(&self, url: &str, fetch: F) -> Result<Value, SnapshotError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, SnapshotError>>,
    {
        let path = self.artifact_path(url, ArtifactKind::Json);
        if !self.reload && path.is_file() {
            tracing::debug!("cache hit: {}", path.display());
            let text = fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&text)?);
        }

        let value = fetch().await?;
        self.persist(&path, serde_json::to_string_pretty(&value)?.as_bytes())?;
        Ok(value)
    }

    /// Returns the on-disk path of the cached PDF for `url`, fetching and
    /// persisting the bytes first on a miss (or whenever force-reload is set).
    pub async fn get_or_fetch_pdf<F, Fut>(&self, url: &str, fetch: F) -> Result<PathBuf, SnapshotError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, SnapshotError>>,
    {
        let path = self.artifact_path(url, ArtifactKind::Pdf);
        if !self.reload && path.is_file() {
            tracing::debug!("cache hit: {}", path.display());
            return Ok(path);
        }

        let bytes = fetch().await?;
        self.persist(&path, &bytes)?;
        Ok(path)
    }

    /// Writes an artifact via a temp file and rename, so a failed write
    /// never leaves a half-written file at the final path.
    fn persist(&self, path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        tracing::info!("cached: {}", path.display());
        Ok(())
    }
}
