use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource};

/// A pluggable source of skip segments.
///
/// `detect` never fails: errors, timeouts and missing data are reported as a
/// failed `DetectionResult`. Implementations check `cancel` at I/O boundaries.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn source(&self) -> DetectionSource;

    /// Fixed priority rank. Higher wins ties in the orchestrator.
    fn tier(&self) -> u8;

    /// Cheap, side-effect free check whether `detect` is worth calling.
    fn is_available(&self) -> bool;

    async fn detect(
        &self,
        identity: &ContentIdentity,
        cancel: &CancellationToken,
    ) -> DetectionResult;

    /// Called before each run's fan-out so session-scoped strategies can reset.
    fn prepare(&self, _identity: &ContentIdentity) {}
}
