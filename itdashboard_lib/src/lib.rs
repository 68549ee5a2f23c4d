//! Library layer for the IT Dashboard snapshot exporter: disk-cached,
//! rate-limited API client, PDF field extraction, and workbook export.
//!
//! Wraps the `itdashboard_api` crate with a read-through disk cache and a
//! fixed inter-request delay, then aggregates agencies and investments into
//! a multi-sheet xlsx workbook.

pub mod cache;
pub mod client;
pub mod error;
pub mod export;
pub mod pdf;

pub use itdashboard_api;
pub use itdashboard_api::types;
pub use itdashboard_api::Page;

pub use cache::{ArtifactKind, DiskCache};
pub use client::SnapshotClient;
pub use error::SnapshotError;
pub use export::{ExportConfig, Exporter};
