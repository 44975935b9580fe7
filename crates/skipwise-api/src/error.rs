use thiserror::Error;

/// Errors from the segment providers and the catalog client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing identifier: {0}")]
    MissingId(&'static str),

    #[error("request cancelled")]
    Cancelled,
}
