use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::cache::ResultCache;
use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource};
use crate::strategy::Strategy;

/// Reads previously stored results. Used for the orchestrator's cache probe,
/// never registered for fan-out.
#[derive(Clone)]
pub struct CacheStrategy {
    cache: ResultCache,
}

impl CacheStrategy {
    pub fn new(cache: ResultCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Strategy for CacheStrategy {
    fn name(&self) -> &'static str {
        "Local Cache"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::Cache
    }

    fn tier(&self) -> u8 {
        0
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn detect(
        &self,
        identity: &ContentIdentity,
        cancel: &CancellationToken,
    ) -> DetectionResult {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => DetectionResult::failed(self.source(), "Lookup cancelled."),
            result = self.cache.lookup(identity) => result,
        }
    }
}
