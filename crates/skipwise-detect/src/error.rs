use thiserror::Error;

/// Errors from live marker capture.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("no playback session is bound")]
    NotBound,

    #[error("no tokio runtime available to listen for markers")]
    NoRuntime,
}
