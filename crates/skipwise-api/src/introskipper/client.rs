use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ApiError;
use crate::http;
use crate::query::{id, EpisodeQuery};
use crate::schema::{parse_segments, RemoteSegment};

/// Public Intro-Skipper mirror used by Stremio and Jellyfin add-ons.
pub const DEFAULT_BASE_URL: &str = "https://busy-jacinta-shugi-c2885b2e.koyeb.app";

/// Intro-Skipper community segment client.
pub struct IntroSkipperClient {
    base_url: String,
    http: Client,
}

impl IntroSkipperClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.into(),
            http: http::client_with_timeout(timeout)?,
        })
    }

    /// Episode endpoint by Trakt id, falling back to IMDb.
    pub fn episode_url(&self, query: &EpisodeQuery) -> Result<Url, ApiError> {
        let (season, episode) = query
            .coordinates()
            .ok_or(ApiError::MissingId("season/episode"))?;
        let (season, episode) = (season.to_string(), episode.to_string());

        let (scheme, ext_id) = match (id(&query.trakt_id), id(&query.imdb_id)) {
            (Some(trakt), _) => ("trakt", trakt),
            (None, Some(imdb)) => ("imdb", imdb),
            (None, None) => return Err(ApiError::MissingId("trakt or imdb")),
        };

        http::endpoint(&self.base_url, &[scheme, ext_id, &season, &episode])
    }

    pub async fn fetch_segments(
        &self,
        query: &EpisodeQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteSegment>, ApiError> {
        let url = self.episode_url(query)?;
        tracing::debug!(%url, "querying Intro-Skipper");
        let body = http::fetch_json(self.http.get(url), cancel).await?;
        parse_segments(&body)
    }
}
