//! Error types shared by the iaseek core.
//!
//! Remote failures are opaque to the session: it only reports them and keeps the
//! previous state, so the variants exist for messages and logs, not for branching.

use thiserror::Error;

/// Failure of a catalog or lookup request.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}

/// Failure of a clipboard or open-locator provider.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no usable {0} helper found")]
    Unavailable(&'static str),

    #[error("{program} failed: {reason}")]
    Failed { program: String, reason: String },
}
