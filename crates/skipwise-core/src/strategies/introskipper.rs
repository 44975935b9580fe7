use std::sync::Arc;

use async_trait::async_trait;
use skipwise_api::{ApiError, IntroSkipperClient};
use skipwise_detect::KeywordDatabase;
use tokio_util::sync::CancellationToken;

use super::remote_result;
use crate::config::ProviderConfig;
use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource};
use crate::strategy::Strategy;

const CONFIDENCE: f32 = 0.75;

/// Community segments from an Intro-Skipper server, looked up by Trakt or IMDb id.
pub struct IntroSkipperStrategy {
    client: IntroSkipperClient,
    usable: bool,
    keywords: Arc<KeywordDatabase>,
}

impl IntroSkipperStrategy {
    pub fn new(config: &ProviderConfig, keywords: Arc<KeywordDatabase>) -> Result<Self, ApiError> {
        Ok(Self {
            client: IntroSkipperClient::new(config.base_url.clone(), config.timeout())?,
            usable: config.is_usable(),
            keywords,
        })
    }
}

#[async_trait]
impl Strategy for IntroSkipperStrategy {
    fn name(&self) -> &'static str {
        "Intro-Skipper (Stremio/Jellyfin)"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::IntroSkipper
    }

    fn tier(&self) -> u8 {
        3
    }

    fn is_available(&self) -> bool {
        self.usable
    }

    async fn detect(
        &self,
        identity: &ContentIdentity,
        cancel: &CancellationToken,
    ) -> DetectionResult {
        let response = self
            .client
            .fetch_segments(&identity.episode_query(), cancel)
            .await;
        remote_result(self.source(), CONFIDENCE, &self.keywords, response)
    }
}
