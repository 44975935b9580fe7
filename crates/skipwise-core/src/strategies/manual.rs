use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource, Segment, SegmentKind};
use crate::preferences::{ManualPreferences, PreferenceStore};
use crate::strategy::Strategy;

const CONFIDENCE: f32 = 0.70;

/// Skip times the user entered by hand. Last resort, always available.
pub struct ManualPreferenceStrategy {
    prefs: Arc<dyn PreferenceStore>,
}

impl ManualPreferenceStrategy {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }
}

/// Segments implied by manual settings for an asset of `runtime` seconds.
pub fn manual_segments(prefs: &ManualPreferences, runtime: i64) -> Vec<Segment> {
    let mut segments = Vec::new();

    if prefs.intro_end > prefs.intro_start {
        segments.push(Segment::new(SegmentKind::Intro, prefs.intro_start, prefs.intro_end));
    }
    if prefs.recap_end > prefs.recap_start {
        segments.push(Segment::new(SegmentKind::Recap, prefs.recap_start, prefs.recap_end));
    }
    if prefs.credits_offset > 0 && runtime > 0 {
        let credits_start = runtime - prefs.credits_offset;
        if credits_start > 0 {
            segments.push(Segment::new(SegmentKind::Credits, credits_start, runtime));
        }
    }
    let next = prefs.next_episode_start;
    if next > 0 && runtime > 0 && next < runtime {
        segments.push(Segment::new(SegmentKind::NextEpisodeCue, next, runtime));
    }

    segments
}

#[async_trait]
impl Strategy for ManualPreferenceStrategy {
    fn name(&self) -> &'static str {
        "Manual Preferences"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::ManualPreference
    }

    fn tier(&self) -> u8 {
        1
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn detect(
        &self,
        identity: &ContentIdentity,
        _cancel: &CancellationToken,
    ) -> DetectionResult {
        let prefs = ManualPreferences::read(self.prefs.as_ref());
        let segments = manual_segments(&prefs, identity.runtime_secs());
        if segments.is_empty() {
            return DetectionResult::failed(self.source(), "No manual skip times set.");
        }
        DetectionResult::success(self.source(), CONFIDENCE, segments)
    }
}
