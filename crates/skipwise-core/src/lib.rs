pub mod cache;
pub mod config;
pub mod error;
pub mod event_log;
pub mod identity;
pub mod markers;
pub mod model;
pub mod orchestrator;
pub mod preferences;
pub mod strategies;
pub mod strategy;

pub use cache::{CacheHandle, CacheStore, ResultCache};
pub use config::AppConfig;
pub use error::SkipError;
pub use event_log::{DetectionEvent, EventLog, RunPhase, RunReport, SharedEventLog};
pub use identity::{ContentIdentity, ContentIdentityBuilder, ExternalIds};
pub use markers::SkipMarkers;
pub use model::{CacheEntry, DetectionResult, DetectionSource, Segment, SegmentKind};
pub use orchestrator::{DetectionCallback, DetectionSettings, Orchestrator, OrchestratorBuilder};
pub use preferences::{AutoSkip, ManualPreferences, PreferenceStore};
pub use strategy::Strategy;
