use std::time::Duration;

use async_trait::async_trait;

use crate::models::job::{JobKind, SourceFile};

const IMAGE_PLACEHOLDER: &str = concat!(
    "This is a simulated OCR result. In a real implementation, an OCR engine ",
    "would extract the actual text from your uploaded image.\n\n",
    "Connect an OCR backend to enable real text extraction."
);

const AUDIO_PLACEHOLDER: &str = concat!(
    "This is a simulated transcription result. In a real implementation, a ",
    "speech-to-text API would convert your audio into text.\n\n",
    "Connect a speech-to-text backend to enable real transcription."
);

/// Converts an uploaded file to text.
///
/// The engine races this call against its progress ticks. Resolving the
/// future is the job's single terminal signal.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn transcribe(&self, kind: JobKind, source: &SourceFile)
        -> Result<String, ProcessingFault>;
}

/// Backend that waits a fixed per-kind delay and returns placeholder text.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    image_delay: Duration,
    audio_delay: Duration,
}

impl SimulatedBackend {
    pub fn new(image_delay: Duration, audio_delay: Duration) -> Self {
        Self {
            image_delay,
            audio_delay,
        }
    }

    pub fn delay(&self, kind: JobKind) -> Duration {
        match kind {
            JobKind::Image => self.image_delay,
            JobKind::Audio => self.audio_delay,
        }
    }

    pub fn placeholder(kind: JobKind) -> &'static str {
        match kind {
            JobKind::Image => IMAGE_PLACEHOLDER,
            JobKind::Audio => AUDIO_PLACEHOLDER,
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000), Duration::from_millis(4000))
    }
}

#[async_trait]
impl TranscriptionBackend for SimulatedBackend {
    async fn transcribe(
        &self,
        kind: JobKind,
        source: &SourceFile,
    ) -> Result<String, ProcessingFault> {
        tracing::debug!(
            kind = %kind,
            file = %source.name,
            delay_ms = self.delay(kind).as_millis() as u64,
            "Simulating transcription"
        );
        tokio::time::sleep(self.delay(kind)).await;
        Ok(Self::placeholder(kind).to_string())
    }
}

/// Mid-run failure reported by a backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ProcessingFault(pub String);
