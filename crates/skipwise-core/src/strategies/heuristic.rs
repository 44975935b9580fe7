use async_trait::async_trait;
use skipwise_api::{ApiError, TraktClient};
use tokio_util::sync::CancellationToken;

use crate::config::CatalogConfig;
use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource, Segment, SegmentKind};
use crate::strategy::Strategy;

const CONFIDENCE: f32 = 0.40;

/// Fixed-offset guesses derived from episode runtime.
pub struct MetadataHeuristicStrategy {
    has_api_key: bool,
    trakt: Option<TraktClient>,
}

impl MetadataHeuristicStrategy {
    pub fn new(catalog: &CatalogConfig) -> Result<Self, ApiError> {
        let trakt = if catalog.trakt_api_key.trim().is_empty() {
            None
        } else {
            Some(TraktClient::new(
                catalog.trakt_base_url.clone(),
                catalog.trakt_api_key.clone(),
                catalog.timeout(),
            )?)
        };
        Ok(Self {
            has_api_key: catalog.has_api_key(),
            trakt,
        })
    }

    /// Runtime from the identity, or from Trakt when the identity has none.
    async fn runtime(
        &self,
        identity: &ContentIdentity,
        cancel: &CancellationToken,
    ) -> Result<i64, ApiError> {
        if identity.runtime_secs() > 0 {
            return Ok(identity.runtime_secs());
        }
        let (Some(trakt), Some(show_id)) = (&self.trakt, identity.ids().trakt.as_deref()) else {
            return Ok(0);
        };
        let (Some(season), Some(episode)) = (identity.season(), identity.episode()) else {
            return Ok(0);
        };
        let fetched = trakt
            .episode_runtime(show_id, season, episode, cancel)
            .await?;
        Ok(fetched.unwrap_or(0))
    }
}

/// Intro and credits guesses for an episode of `runtime` seconds.
pub fn heuristic_segments(runtime: i64) -> Vec<Segment> {
    let (intro_len, credits_len) = if runtime >= 20 * 60 {
        (90, 180)
    } else if runtime >= 15 * 60 {
        (60, 120)
    } else {
        return Vec::new();
    };

    let mut segments = vec![Segment::new(SegmentKind::Intro, 0, intro_len)];
    let credits_start = runtime - credits_len;
    if credits_start > 0 {
        segments.push(Segment::new(SegmentKind::Credits, credits_start, runtime));
    }
    segments
}

#[async_trait]
impl Strategy for MetadataHeuristicStrategy {
    fn name(&self) -> &'static str {
        "Metadata-Based Heuristics"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::MetadataHeuristic
    }

    fn tier(&self) -> u8 {
        4
    }

    fn is_available(&self) -> bool {
        self.has_api_key
    }

    async fn detect(
        &self,
        identity: &ContentIdentity,
        cancel: &CancellationToken,
    ) -> DetectionResult {
        if !identity.is_series() {
            return DetectionResult::failed(self.source(), "Heuristics only apply to episodes.");
        }

        let runtime = match self.runtime(identity, cancel).await {
            Ok(runtime) => runtime,
            Err(ApiError::Cancelled) => {
                return DetectionResult::failed(self.source(), "Lookup cancelled.")
            }
            Err(e) => {
                tracing::debug!(error = %e, "runtime lookup failed");
                return DetectionResult::failed(
                    self.source(),
                    format!("Runtime lookup failed: {e}"),
                );
            }
        };
        if runtime <= 0 {
            return DetectionResult::failed(self.source(), "No valid runtime found or fetched.");
        }

        let segments = heuristic_segments(runtime);
        if segments.is_empty() {
            return DetectionResult::failed(self.source(), "Runtime too short for heuristics.");
        }
        DetectionResult::success(self.source(), CONFIDENCE, segments)
    }
}
