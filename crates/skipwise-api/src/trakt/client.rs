use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::types::TraktMedia;
use crate::error::ApiError;
use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://api.trakt.tv";
const API_VERSION: &str = "2";

/// Trakt catalog client, used only for runtime lookups.
pub struct TraktClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl TraktClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: http::client_with_timeout(timeout)?,
        })
    }

    fn extended(mut url: Url) -> Url {
        url.query_pairs_mut().append_pair("extended", "full");
        url
    }

    /// Runtime in seconds of a show episode, if Trakt reports one.
    pub async fn episode_runtime(
        &self,
        show_id: &str,
        season: u32,
        episode: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<i64>, ApiError> {
        let (season, episode) = (season.to_string(), episode.to_string());
        let url = Self::extended(http::endpoint(
            &self.base_url,
            &["shows", show_id, "seasons", &season, "episodes", &episode],
        )?);
        self.runtime(url, cancel).await
    }

    async fn runtime(&self, url: Url, cancel: &CancellationToken) -> Result<Option<i64>, ApiError> {
        tracing::debug!(%url, "querying Trakt");
        let request = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.api_key);
        let body = http::fetch_json(request, cancel).await?;
        let media: TraktMedia =
            serde_json::from_value(body).map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(media.runtime.filter(|m| *m > 0).map(|m| m * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> TraktClient {
        TraktClient::new(base, "key-123", Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_episode_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/1390/seasons/1/episodes/1"))
            .and(query_param("extended", "full"))
            .and(header("trakt-api-version", "2"))
            .and(header("trakt-api-key", "key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Winter Is Coming",
                "runtime": 62
            })))
            .mount(&server)
            .await;

        let runtime = client(&server.uri())
            .episode_runtime("1390", 1, 1, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(runtime, Some(3720));
    }

    #[tokio::test]
    async fn test_episode_without_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shows/tron-uprising/seasons/1/episodes/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Beck"})))
            .mount(&server)
            .await;

        let runtime = client(&server.uri())
            .episode_runtime("tron-uprising", 1, 2, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(runtime, None);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .episode_runtime("x", 1, 1, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 401, .. }));
    }
}
