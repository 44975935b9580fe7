pub mod handle;
pub mod store;

use chrono::Utc;

pub use handle::CacheHandle;
pub use store::CacheStore;

use crate::config::{AppConfig, CacheConfig};
use crate::error::SkipError;
use crate::identity::ContentIdentity;
use crate::model::{CacheEntry, DetectionResult, DetectionSource};

pub const DEFAULT_TTL_DAYS: i64 = 30;
pub const DEFAULT_HIT_CONFIDENCE: f32 = 0.95;

/// Expiring, keyed store of terminal detection results.
#[derive(Clone)]
pub struct ResultCache {
    handle: CacheHandle,
    ttl_days: i64,
    hit_confidence: f32,
}

impl ResultCache {
    pub fn new(handle: CacheHandle) -> Self {
        Self {
            handle,
            ttl_days: DEFAULT_TTL_DAYS,
            hit_confidence: DEFAULT_HIT_CONFIDENCE,
        }
    }

    pub fn from_config(handle: CacheHandle, config: &CacheConfig) -> Self {
        Self::new(handle)
            .with_ttl_days(config.ttl_days)
            .with_hit_confidence(config.hit_confidence)
    }

    /// On-disk cache at the platform cache directory.
    pub fn open_default(config: &AppConfig) -> Result<Self, SkipError> {
        let path = AppConfig::ensure_cache_db_path()?;
        Ok(Self::from_config(CacheHandle::open(&path)?, &config.cache))
    }

    /// In-memory cache with default settings.
    pub fn in_memory() -> Result<Self, SkipError> {
        Ok(Self::new(CacheHandle::open_memory()?))
    }

    pub fn with_ttl_days(mut self, ttl_days: i64) -> Self {
        self.ttl_days = ttl_days.max(0);
        self
    }

    pub fn with_hit_confidence(mut self, confidence: f32) -> Self {
        self.hit_confidence = confidence;
        self
    }

    pub fn ttl_days(&self) -> i64 {
        self.ttl_days
    }

    /// Cached segments for `identity` as a `Cache` success, or a failure if
    /// absent, expired (the entry is deleted) or unreadable.
    pub async fn lookup(&self, identity: &ContentIdentity) -> DetectionResult {
        let key = identity.cache_key();
        let entry = match self.handle.get(&key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                return DetectionResult::failed(DetectionSource::Cache, "No cached data found.")
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed");
                return DetectionResult::failed(
                    DetectionSource::Cache,
                    format!("Cache read failed: {e}"),
                );
            }
        };

        if entry.is_expired(self.ttl_days, Utc::now()) {
            tracing::debug!(key = %key, stored_at = %entry.stored_at, "cache entry expired");
            if let Err(e) = self.handle.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "failed to delete expired cache entry");
            }
            return DetectionResult::failed(DetectionSource::Cache, "Cached data expired.");
        }

        tracing::debug!(key = %key, original = %entry.source, "cache hit");
        DetectionResult::success(DetectionSource::Cache, self.hit_confidence, entry.segments)
    }

    /// Persist a terminal result. Failures and results served from the cache
    /// are ignored.
    pub async fn store(
        &self,
        identity: &ContentIdentity,
        result: &DetectionResult,
    ) -> Result<(), SkipError> {
        if !result.is_success() || result.source() == DetectionSource::Cache {
            return Ok(());
        }
        self.put_entry(CacheEntry {
            key: identity.cache_key(),
            segments: result.segments().to_vec(),
            stored_at: Utc::now(),
            source: result.source(),
            confidence: result.confidence(),
        })
        .await
    }

    pub async fn invalidate(&self, identity: &ContentIdentity) -> Result<bool, SkipError> {
        self.handle.delete(&identity.cache_key()).await
    }

    pub async fn clear(&self) -> Result<usize, SkipError> {
        self.handle.clear().await
    }

    /// Raw stored entry, without expiry handling.
    pub async fn entry(&self, identity: &ContentIdentity) -> Result<Option<CacheEntry>, SkipError> {
        self.handle.get(&identity.cache_key()).await
    }

    pub async fn put_entry(&self, entry: CacheEntry) -> Result<(), SkipError> {
        self.handle.put(entry).await
    }

    /// Delete every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, SkipError> {
        let cutoff = Utc::now() - chrono::Duration::days(self.ttl_days);
        self.handle.purge_before(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Segment, SegmentKind};

    fn identity() -> ContentIdentity {
        ContentIdentity::builder()
            .show("Show")
            .episode(1, 1)
            .runtime_secs(1320)
            .build()
    }

    fn manual_result() -> DetectionResult {
        DetectionResult::success(
            DetectionSource::ManualPreference,
            0.7,
            vec![
                Segment::new(SegmentKind::Intro, 0, 90),
                Segment::new(SegmentKind::Credits, 1140, 1320),
            ],
        )
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let cache = ResultCache::in_memory().unwrap();
        cache.store(&identity(), &manual_result()).await.unwrap();

        let hit = cache.lookup(&identity()).await;
        assert!(hit.is_success());
        assert_eq!(hit.source(), DetectionSource::Cache);
        assert!((hit.confidence() - 0.95).abs() < f32::EPSILON);
        assert_eq!(hit.segments(), manual_result().segments());

        let entry = cache.entry(&identity()).await.unwrap().unwrap();
        assert_eq!(entry.source, DetectionSource::ManualPreference);
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let cache = ResultCache::in_memory().unwrap();
        let miss = cache.lookup(&identity()).await;
        assert!(!miss.is_success());
        assert_eq!(miss.source(), DetectionSource::Cache);
    }

    #[tokio::test]
    async fn test_expired_entry_removed_on_lookup() {
        let cache = ResultCache::in_memory().unwrap();
        cache
            .put_entry(CacheEntry {
                key: identity().cache_key(),
                segments: manual_result().segments().to_vec(),
                stored_at: Utc::now() - chrono::Duration::days(31),
                source: DetectionSource::ManualPreference,
                confidence: 0.7,
            })
            .await
            .unwrap();

        assert!(!cache.lookup(&identity()).await.is_success());
        assert!(cache.entry(&identity()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_and_failed_results_not_stored() {
        let cache = ResultCache::in_memory().unwrap();
        let from_cache = DetectionResult::success(
            DetectionSource::Cache,
            0.95,
            vec![Segment::new(SegmentKind::Intro, 0, 90)],
        );
        cache.store(&identity(), &from_cache).await.unwrap();
        let failed = DetectionResult::failed(DetectionSource::None, "nothing");
        cache.store(&identity(), &failed).await.unwrap();

        assert!(cache.entry(&identity()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = ResultCache::in_memory().unwrap();
        cache.store(&identity(), &manual_result()).await.unwrap();
        assert!(cache.invalidate(&identity()).await.unwrap());
        assert!(!cache.lookup(&identity()).await.is_success());

        cache.store(&identity(), &manual_result()).await.unwrap();
        let other = ContentIdentity::builder().title("Heat").build();
        cache.store(&other, &manual_result()).await.unwrap();
        assert_eq!(cache.clear().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = ResultCache::in_memory().unwrap().with_ttl_days(7);
        cache
            .put_entry(CacheEntry {
                key: "old".into(),
                segments: manual_result().segments().to_vec(),
                stored_at: Utc::now() - chrono::Duration::days(8),
                source: DetectionSource::IntroSkipper,
                confidence: 0.75,
            })
            .await
            .unwrap();
        cache.store(&identity(), &manual_result()).await.unwrap();
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
    }
}
