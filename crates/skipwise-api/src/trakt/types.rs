use serde::Deserialize;

/// The subset of a Trakt `extended=full` episode we use.
#[derive(Debug, Clone, Deserialize)]
pub struct TraktMedia {
    pub title: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<i64>,
}
