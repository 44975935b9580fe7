use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ApiError;
use crate::http;
use crate::query::{id, EpisodeQuery};
use crate::schema::{parse_segments, RemoteSegment};

pub const DEFAULT_BASE_URL: &str = "https://introhater.com/api";

/// IntroHater community segment client.
pub struct IntroHaterClient {
    base_url: String,
    http: Client,
}

impl IntroHaterClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.into(),
            http: http::client_with_timeout(timeout)?,
        })
    }

    /// Episode endpoint by TMDB id, falling back to IMDb.
    pub fn episode_url(&self, query: &EpisodeQuery) -> Result<Url, ApiError> {
        let (season, episode) = query
            .coordinates()
            .ok_or(ApiError::MissingId("season/episode"))?;
        let (season, episode) = (season.to_string(), episode.to_string());

        let (scheme, ext_id) = if let Some(tmdb) = id(&query.tmdb_id) {
            ("tmdb", tmdb)
        } else if let Some(imdb) = id(&query.imdb_id) {
            ("imdb", imdb)
        } else {
            return Err(ApiError::MissingId("tmdb or imdb"));
        };

        http::endpoint(
            &self.base_url,
            &[scheme, ext_id, "season", &season, "episode", &episode],
        )
    }

    /// Fetch the raw segments for an episode.
    pub async fn fetch_segments(
        &self,
        query: &EpisodeQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteSegment>, ApiError> {
        let url = self.episode_url(query)?;
        tracing::debug!(%url, "querying IntroHater");
        let body = http::fetch_json(self.http.get(url), cancel).await?;
        parse_segments(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> EpisodeQuery {
        EpisodeQuery {
            imdb_id: Some("tt0944947".into()),
            tmdb_id: Some("1399".into()),
            season: Some(1),
            episode: Some(2),
            ..Default::default()
        }
    }

    fn client(base: &str) -> IntroHaterClient {
        IntroHaterClient::new(base, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_url_prefers_tmdb() {
        let url = client(DEFAULT_BASE_URL).episode_url(&query()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://introhater.com/api/tmdb/1399/season/1/episode/2"
        );
    }

    #[test]
    fn test_url_falls_back_to_imdb() {
        let mut q = query();
        q.tmdb_id = Some(String::new());
        let url = client(DEFAULT_BASE_URL).episode_url(&q).unwrap();
        assert_eq!(
            url.as_str(),
            "https://introhater.com/api/imdb/tt0944947/season/1/episode/2"
        );
    }

    #[test]
    fn test_url_requires_ids() {
        let q = EpisodeQuery {
            season: Some(1),
            episode: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            client(DEFAULT_BASE_URL).episode_url(&q),
            Err(ApiError::MissingId(_))
        ));
        let mut q = query();
        q.episode = None;
        assert!(matches!(
            client(DEFAULT_BASE_URL).episode_url(&q),
            Err(ApiError::MissingId(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tmdb/1399/season/1/episode/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "segments": [
                    {"type": "intro", "start": 0, "end": 85},
                    {"type": "credits", "start": 3300, "end": 3400}
                ]
            })))
            .mount(&server)
            .await;

        let segments = client(&server.uri())
            .fetch_segments(&query(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].tag, "intro");
        assert_eq!(segments[1].end_secs, 3400);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .fetch_segments(&query(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .fetch_segments(&query(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"segments": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client(&server.uri())
            .fetch_segments(&query(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }
}
