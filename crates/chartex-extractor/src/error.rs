//! Error types for the extraction pipeline

use thiserror::Error;

/// Errors that can occur during extraction.
///
/// Only `Config` ever reaches callers (construction-time validation). The
/// remaining variants drive the per-batch retry machine and are consumed
/// before `extract` returns: an exhausted batch degrades to empty records
/// instead of propagating.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid configuration or schema
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion service failure (network, auth, quota, timeout)
    #[error("Completion error: {0}")]
    Completion(String),

    /// The completion call succeeded but returned no content
    #[error("Completion returned empty content")]
    EmptyResponse,

    /// No parse strategy produced any records from the response
    #[error("Response yielded no parseable records")]
    UnparseableResponse,
}
