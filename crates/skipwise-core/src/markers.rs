use crate::model::{DetectionResult, Segment, SegmentKind};
use crate::preferences::AutoSkip;

/// Seconds either side of the next-episode cue in which it is considered active.
pub const NEXT_EPISODE_WINDOW_SECS: i64 = 15;

/// Playback-position queries over a detection result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipMarkers {
    intro: Option<Segment>,
    recap: Option<Segment>,
    credits: Option<Segment>,
    next_episode: Option<Segment>,
}

impl SkipMarkers {
    /// Keep the first segment of each kind. A failed result yields no markers.
    pub fn from_result(result: &DetectionResult) -> Self {
        Self {
            intro: result.segment(SegmentKind::Intro).copied(),
            recap: result.segment(SegmentKind::Recap).copied(),
            credits: result.segment(SegmentKind::Credits).copied(),
            next_episode: result.segment(SegmentKind::NextEpisodeCue).copied(),
        }
    }

    pub fn get(&self, kind: SegmentKind) -> Option<&Segment> {
        match kind {
            SegmentKind::Intro => self.intro.as_ref(),
            SegmentKind::Recap => self.recap.as_ref(),
            SegmentKind::Credits => self.credits.as_ref(),
            SegmentKind::NextEpisodeCue => self.next_episode.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        SegmentKind::ALL.iter().all(|k| self.get(*k).is_none())
    }

    pub fn is_in(&self, kind: SegmentKind, position_secs: i64) -> bool {
        self.get(kind).is_some_and(|s| s.contains(position_secs))
    }

    pub fn is_at_next_episode(&self, position_secs: i64) -> bool {
        self.next_episode.is_some_and(|s| {
            s.start_secs > 0
                && position_secs >= s.start_secs - NEXT_EPISODE_WINDOW_SECS
                && position_secs < s.start_secs + NEXT_EPISODE_WINDOW_SECS
        })
    }

    /// The skippable segment under `position_secs`. Intro, recap and credits
    /// are checked in that order; the next-episode cue counts inside its window.
    pub fn active(&self, position_secs: i64) -> Option<SegmentKind> {
        [SegmentKind::Intro, SegmentKind::Recap, SegmentKind::Credits]
            .into_iter()
            .find(|k| self.is_in(*k, position_secs))
            .or_else(|| {
                self.is_at_next_episode(position_secs)
                    .then_some(SegmentKind::NextEpisodeCue)
            })
    }

    /// Where playback should jump to, if the active segment has auto-skip on.
    pub fn auto_skip_target(&self, position_secs: i64, auto: &AutoSkip) -> Option<i64> {
        let kind = self.active(position_secs)?;
        let enabled = match kind {
            SegmentKind::Intro => auto.intro,
            SegmentKind::Recap => auto.recap,
            SegmentKind::Credits => auto.credits,
            SegmentKind::NextEpisodeCue => false,
        };
        if !enabled {
            return None;
        }
        self.get(kind).map(|s| s.end_secs)
    }
}
