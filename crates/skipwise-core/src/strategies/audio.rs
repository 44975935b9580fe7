use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource};
use crate::strategy::Strategy;

/// Placeholder for audio-signature detection. Always reports failure.
#[derive(Debug, Default)]
pub struct AudioFingerprintStrategy;

impl AudioFingerprintStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Strategy for AudioFingerprintStrategy {
    fn name(&self) -> &'static str {
        "Audio Fingerprinting"
    }

    fn source(&self) -> DetectionSource {
        DetectionSource::AudioFingerprint
    }

    fn tier(&self) -> u8 {
        2
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn detect(
        &self,
        _identity: &ContentIdentity,
        _cancel: &CancellationToken,
    ) -> DetectionResult {
        DetectionResult::failed(self.source(), "Audio analysis not implemented.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_fails() {
        let s = AudioFingerprintStrategy::new();
        assert!(s.is_available());
        let r = s
            .detect(&ContentIdentity::default(), &CancellationToken::new())
            .await;
        assert!(!r.is_success());
        assert_eq!(r.error(), Some("Audio analysis not implemented."));
    }
}
