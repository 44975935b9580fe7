use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skipwise_detect::MarkerKind;

/// What a skippable range contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Intro,
    Recap,
    Credits,
    NextEpisodeCue,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 4] = [
        SegmentKind::Intro,
        SegmentKind::Recap,
        SegmentKind::Credits,
        SegmentKind::NextEpisodeCue,
    ];
}

impl From<MarkerKind> for SegmentKind {
    fn from(kind: MarkerKind) -> Self {
        match kind {
            MarkerKind::Intro => SegmentKind::Intro,
            MarkerKind::Recap => SegmentKind::Recap,
            MarkerKind::Credits => SegmentKind::Credits,
            MarkerKind::NextEpisode => SegmentKind::NextEpisodeCue,
        }
    }
}

/// A typed time range in whole seconds, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start_secs: i64,
    pub end_secs: i64,
}

impl Segment {
    pub fn new(kind: SegmentKind, start_secs: i64, end_secs: i64) -> Self {
        Self {
            kind,
            start_secs,
            end_secs,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start_secs >= 0 && self.end_secs > self.start_secs
    }

    /// Start-inclusive, end-exclusive.
    pub fn contains(&self, position_secs: i64) -> bool {
        position_secs >= self.start_secs && position_secs < self.end_secs
    }

    pub fn duration(&self) -> i64 {
        self.end_secs - self.start_secs
    }
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionSource {
    ManualPreference,
    Cache,
    ChapterMarkers,
    MetadataHeuristic,
    IntroHater,
    IntroSkipper,
    AudioFingerprint,
    None,
}

impl DetectionSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ManualPreference => "Manual Settings",
            Self::Cache => "Cache",
            Self::ChapterMarkers => "Chapter Markers",
            Self::MetadataHeuristic => "Metadata Heuristics",
            Self::IntroHater => "IntroHater API",
            Self::IntroSkipper => "Intro-Skipper API",
            Self::AudioFingerprint => "Audio Scan",
            Self::None => "None",
        }
    }

    /// Stable name used in the cache database.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::ManualPreference => "manual_preference",
            Self::Cache => "cache",
            Self::ChapterMarkers => "chapter_markers",
            Self::MetadataHeuristic => "metadata_heuristic",
            Self::IntroHater => "introhater",
            Self::IntroSkipper => "introskipper",
            Self::AudioFingerprint => "audio_fingerprint",
            Self::None => "none",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "manual_preference" => Some(Self::ManualPreference),
            "cache" => Some(Self::Cache),
            "chapter_markers" => Some(Self::ChapterMarkers),
            "metadata_heuristic" => Some(Self::MetadataHeuristic),
            "introhater" => Some(Self::IntroHater),
            "introskipper" => Some(Self::IntroSkipper),
            "audio_fingerprint" => Some(Self::AudioFingerprint),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Outcome of one strategy, or the terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    success: bool,
    source: DetectionSource,
    confidence: f32,
    segments: Vec<Segment>,
    error: Option<String>,
}

impl DetectionResult {
    /// A successful result. Invalid segments are dropped; if none remain the
    /// result is a failure instead.
    pub fn success(source: DetectionSource, confidence: f32, segments: Vec<Segment>) -> Self {
        let segments: Vec<Segment> = segments.into_iter().filter(Segment::is_valid).collect();
        if segments.is_empty() {
            return Self::failed(source, "No valid skip segments provided.");
        }
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            success: true,
            source,
            confidence,
            segments,
            error: None,
        }
    }

    pub fn failed(source: DetectionSource, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            source,
            confidence: 0.0,
            segments: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn source(&self) -> DetectionSource {
        self.source
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// First segment of the given kind.
    pub fn segment(&self, kind: SegmentKind) -> Option<&Segment> {
        self.segments.iter().find(|s| s.kind == kind)
    }

    pub fn has_segment(&self, kind: SegmentKind) -> bool {
        self.segment(kind).is_some()
    }
}

/// A stored detection outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub segments: Vec<Segment>,
    pub stored_at: DateTime<Utc>,
    pub source: DetectionSource,
    pub confidence: f32,
}

impl CacheEntry {
    pub fn is_expired(&self, ttl_days: i64, now: DateTime<Utc>) -> bool {
        now - self.stored_at > chrono::Duration::days(ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_contains_is_half_open() {
        let s = Segment::new(SegmentKind::Intro, 10, 20);
        assert!(!s.contains(9));
        assert!(s.contains(10));
        assert!(s.contains(19));
        assert!(!s.contains(20));
        assert_eq!(s.duration(), 10);
    }

    #[test]
    fn test_segment_validity() {
        assert!(Segment::new(SegmentKind::Intro, 0, 1).is_valid());
        assert!(!Segment::new(SegmentKind::Intro, 5, 5).is_valid());
        assert!(!Segment::new(SegmentKind::Intro, -1, 5).is_valid());
    }

    #[test]
    fn test_success_drops_invalid_segments() {
        let r = DetectionResult::success(
            DetectionSource::IntroHater,
            0.8,
            vec![
                Segment::new(SegmentKind::Intro, 0, 90),
                Segment::new(SegmentKind::Credits, 100, 50),
            ],
        );
        assert!(r.is_success());
        assert_eq!(r.segments().len(), 1);
        assert!(r.has_segment(SegmentKind::Intro));
        assert!(!r.has_segment(SegmentKind::Credits));
    }

    #[test]
    fn test_empty_success_becomes_failure() {
        let r = DetectionResult::success(
            DetectionSource::ChapterMarkers,
            0.9,
            vec![Segment::new(SegmentKind::Recap, 30, 30)],
        );
        assert!(!r.is_success());
        assert_eq!(r.confidence(), 0.0);
        assert!(r.segments().is_empty());
        assert!(r.error().is_some());
        assert_eq!(r.source(), DetectionSource::ChapterMarkers);
    }

    #[test]
    fn test_confidence_clamped() {
        let seg = vec![Segment::new(SegmentKind::Intro, 0, 10)];
        let high = DetectionResult::success(DetectionSource::Cache, 1.7, seg.clone());
        assert_eq!(high.confidence(), 1.0);
        let low = DetectionResult::success(DetectionSource::Cache, -0.2, seg);
        assert_eq!(low.confidence(), 0.0);
    }

    #[test]
    fn test_failed_has_no_segments() {
        let r = DetectionResult::failed(DetectionSource::AudioFingerprint, "nope");
        assert!(!r.is_success());
        assert_eq!(r.error(), Some("nope"));
        assert_eq!(r.confidence(), 0.0);
    }

    #[test]
    fn test_source_names() {
        for source in [
            DetectionSource::ManualPreference,
            DetectionSource::Cache,
            DetectionSource::ChapterMarkers,
            DetectionSource::MetadataHeuristic,
            DetectionSource::IntroHater,
            DetectionSource::IntroSkipper,
            DetectionSource::AudioFingerprint,
            DetectionSource::None,
        ] {
            assert_eq!(DetectionSource::from_db_str(source.as_db_str()), Some(source));
        }
        assert_eq!(DetectionSource::IntroSkipper.to_string(), "Intro-Skipper API");
        assert_eq!(DetectionSource::from_db_str("bogus"), None);
    }

    #[test]
    fn test_entry_expiry() {
        let now = Utc::now();
        let entry = CacheEntry {
            key: "k".into(),
            segments: vec![],
            stored_at: now - chrono::Duration::days(31),
            source: DetectionSource::ManualPreference,
            confidence: 0.7,
        };
        assert!(entry.is_expired(30, now));
        assert!(!entry.is_expired(45, now));
    }
}
