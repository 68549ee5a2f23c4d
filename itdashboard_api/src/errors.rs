//! Error types for the dashboard API client.

/// Errors raised while talking to the ITDB2 API.
///
/// The dataset is all-or-nothing per run, so callers treat every variant
/// as fatal; there is no retry layer above this.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced a usable response: network failure, a
    /// bad URL, or a body that could not be read or parsed.
    #[error("Request failed")]
    RequestFailed,
    /// The dashboard answered with a non-200 status; carries a snippet of
    /// the response body for diagnosis.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
}
