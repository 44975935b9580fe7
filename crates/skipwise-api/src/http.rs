use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ApiError;

/// Build an HTTP client whose every request is bounded by `timeout`.
pub fn client_with_timeout(timeout: Duration) -> Result<Client, ApiError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Join path segments onto a base URL, percent-encoding each segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base.trim_end_matches('/'))
        .map_err(|e| ApiError::Parse(format!("invalid base URL {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Parse(format!("base URL cannot have paths: {base:?}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Api {
            status,
            message: body,
        })
    }
}

/// Send a request and decode the JSON body, giving up early if `cancel` fires.
pub async fn fetch_json(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<Value, ApiError> {
    let work = async {
        let resp = request.send().await?;
        let resp = check_response(resp).await?;
        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let url = endpoint("https://example.com/api/", &["tmdb", "1399", "season", "1"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/tmdb/1399/season/1");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let url = endpoint("https://example.com", &["trakt", "a b"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/trakt/a%20b");
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(matches!(
            endpoint("not a url", &["x"]),
            Err(ApiError::Parse(_))
        ));
    }
}
