//! Error types for the library layer.

use std::fmt;

/// Errors produced by the library layer, wrapping upstream API errors and
/// adding cache I/O, serialization, PDF, and workbook failures.
///
/// Nothing here is recovered locally; every variant aborts the run.
#[derive(Debug)]
pub enum SnapshotError {
    /// An error from the underlying API client.
    Api(itdashboard_api::Error),
    /// Cache directory creation or artifact read/write failed.
    Io(std::io::Error),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// A business-case PDF could not be opened or the page is out of range.
    Pdf(String),
    /// The workbook writer rejected a sheet or could not save the file.
    Workbook(rust_xlsxwriter::XlsxError),
    /// An exported record did not have tabular shape.
    Export(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Io(e) => write!(f, "Cache I/O error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Pdf(msg) => write!(f, "PDF error: {}", msg),
            Self::Workbook(e) => write!(f, "Workbook error: {}", e),
            Self::Export(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Workbook(e) => Some(e),
            _ => None,
        }
    }
}

impl From<itdashboard_api::Error> for SnapshotError {
    fn from(e: itdashboard_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<rust_xlsxwriter::XlsxError> for SnapshotError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Workbook(e)
    }
}
