use async_trait::async_trait;
use skipwise_detect::{CapturedMarker, DetectError, MarkerCapture, PlaybackSession};
use tokio_util::sync::CancellationToken;

use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource, Segment, SegmentKind};
use crate::strategy::Strategy;

const CONFIDENCE: f32 = 0.90;

/// Segments taken from chapter markers announced by the player.
pub struct ChapterMarkerStrategy {
    capture: MarkerCapture,
}

impl ChapterMarkerStrategy {
    pub fn new(buffer_capacity: usize) -> Self {
        Self::with_capture(MarkerCapture::new(buffer_capacity))
    }

    pub fn with_capture(capture: MarkerCapture) -> Self {
        Self { capture }
    }

    pub fn capture(&self) -> &MarkerCapture {
        &self.capture
    }

    pub fn bind(&self, session: &dyn PlaybackSession) -> Result<(), DetectError> {
        self.capture.bind(session)
    }

    pub fn unbind(&self) {
        self.capture.unbind();
    }
}

fn to_segment(marker: &CapturedMarker) -> Segment {
    Segment::new(
        SegmentKind::from(marker.kind),
        marker.start_secs,
        marker.end_secs,
    )
}

#[async_trait]
impl Strategy for ChapterMarkerStrategy {
    fn name(&self) -> &'static str {
        "Chapter Markers"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::ChapterMarkers
    }

    fn tier(&self) -> u8 {
        5
    }

    fn is_available(&self) -> bool {
        self.capture.is_bound()
    }

    fn prepare(&self, identity: &ContentIdentity) {
        if self.capture.reset_for(&identity.cache_key()) {
            tracing::debug!(key = %identity.cache_key(), "chapter buffer reset for new asset");
        }
    }

    async fn detect(
        &self,
        _identity: &ContentIdentity,
        _cancel: &CancellationToken,
    ) -> DetectionResult {
        let markers = match self.capture.markers() {
            Ok(markers) => markers,
            Err(DetectError::NotBound) => {
                return DetectionResult::failed(self.source(), "Player is not bound.")
            }
            Err(e) => return DetectionResult::failed(self.source(), e.to_string()),
        };
        let segments: Vec<Segment> = markers.iter().map(to_segment).collect();
        if segments.is_empty() {
            return DetectionResult::failed(self.source(), "No matching chapter segments found.");
        }
        tracing::debug!(count = segments.len(), "chapter segments found");
        DetectionResult::success(self.source(), CONFIDENCE, segments)
    }
}
