pub mod audio;
pub mod cache;
pub mod chapter_markers;
pub mod heuristic;
pub mod introhater;
pub mod introskipper;
pub mod manual;

pub use audio::AudioFingerprintStrategy;
pub use cache::CacheStrategy;
pub use chapter_markers::ChapterMarkerStrategy;
pub use heuristic::MetadataHeuristicStrategy;
pub use introhater::IntroHaterStrategy;
pub use introskipper::IntroSkipperStrategy;
pub use manual::ManualPreferenceStrategy;

use skipwise_api::{ApiError, RemoteSegment};
use skipwise_detect::KeywordDatabase;

use crate::model::{DetectionResult, DetectionSource, Segment, SegmentKind};

/// Map a provider tag onto a segment kind. Tags not covered by the keyword
/// database but mentioning "next" are next-episode cues.
pub fn classify_tag(keywords: &KeywordDatabase, tag: &str) -> Option<SegmentKind> {
    keywords.classify(tag).map(SegmentKind::from).or_else(|| {
        tag.to_lowercase()
            .contains("next")
            .then_some(SegmentKind::NextEpisodeCue)
    })
}

/// Turn a provider response into a strategy result.
pub(crate) fn remote_result(
    source: DetectionSource,
    confidence: f32,
    keywords: &KeywordDatabase,
    response: Result<Vec<RemoteSegment>, ApiError>,
) -> DetectionResult {
    let raw = match response {
        Ok(raw) => raw,
        Err(ApiError::Cancelled) => return DetectionResult::failed(source, "Lookup cancelled."),
        Err(ApiError::MissingId(what)) => {
            return DetectionResult::failed(source, format!("Missing {what}."))
        }
        Err(e) => {
            tracing::debug!(source = %source, error = %e, "segment lookup failed");
            return DetectionResult::failed(source, format!("API call failed: {e}"));
        }
    };

    let segments: Vec<Segment> = raw
        .iter()
        .filter_map(|r| {
            let kind = classify_tag(keywords, &r.tag)?;
            Some(Segment::new(kind, r.start_secs, r.end_secs))
        })
        .collect();

    if segments.is_empty() {
        return DetectionResult::failed(source, "API returned no skip data.");
    }
    tracing::debug!(source = %source, count = segments.len(), "remote segments found");
    DetectionResult::success(source, confidence, segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tag() {
        let db = KeywordDatabase::embedded();
        assert_eq!(classify_tag(&db, "Opening"), Some(SegmentKind::Intro));
        assert_eq!(classify_tag(&db, "outro"), Some(SegmentKind::Credits));
        assert_eq!(classify_tag(&db, "Preview"), Some(SegmentKind::NextEpisodeCue));
        assert_eq!(classify_tag(&db, "next"), Some(SegmentKind::NextEpisodeCue));
        assert_eq!(classify_tag(&db, "commercial"), None);
    }

    #[test]
    fn test_remote_result_drops_unknown_tags() {
        let db = KeywordDatabase::embedded();
        let raw = vec![
            RemoteSegment {
                tag: "intro".into(),
                start_secs: 0,
                end_secs: 80,
            },
            RemoteSegment {
                tag: "sponsor".into(),
                start_secs: 100,
                end_secs: 130,
            },
        ];
        let r = remote_result(DetectionSource::IntroHater, 0.8, &db, Ok(raw));
        assert!(r.is_success());
        assert_eq!(r.segments().len(), 1);

        let empty = remote_result(DetectionSource::IntroHater, 0.8, &db, Ok(vec![]));
        assert!(!empty.is_success());

        let cancelled = remote_result(
            DetectionSource::IntroSkipper,
            0.75,
            &db,
            Err(ApiError::Cancelled),
        );
        assert_eq!(cancelled.error(), Some("Lookup cancelled."));
    }
}
