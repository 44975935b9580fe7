use std::sync::Arc;

use async_trait::async_trait;
use skipwise_api::{ApiError, IntroHaterClient};
use skipwise_detect::KeywordDatabase;
use tokio_util::sync::CancellationToken;

use super::remote_result;
use crate::config::ProviderConfig;
use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource};
use crate::strategy::Strategy;

const CONFIDENCE: f32 = 0.80;

/// Community segments from IntroHater, looked up by TMDB or IMDb id.
pub struct IntroHaterStrategy {
    client: IntroHaterClient,
    usable: bool,
    keywords: Arc<KeywordDatabase>,
}

impl IntroHaterStrategy {
    pub fn new(config: &ProviderConfig, keywords: Arc<KeywordDatabase>) -> Result<Self, ApiError> {
        Ok(Self {
            client: IntroHaterClient::new(config.base_url.clone(), config.timeout())?,
            usable: config.is_usable(),
            keywords,
        })
    }
}

#[async_trait]
impl Strategy for IntroHaterStrategy {
    fn name(&self) -> &'static str {
        "IntroHater"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::IntroHater
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
