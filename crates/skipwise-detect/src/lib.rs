pub mod capture;
pub mod error;
pub mod keywords;

pub use capture::{
    CapturedMarker, ChapterMarker, MarkerBuffer, MarkerCapture, MarkerEvent, PlaybackSession,
};
pub use error::DetectError;
pub use keywords::{KeywordDatabase, KindDef, MarkerKind};
