use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Kind of conversion requested for an uploaded file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JobKind {
    /// OCR over an `image/*` upload.
    Image,
    /// Speech-to-text over an `audio/*` upload.
    Audio,
}

impl JobKind {
    /// Top-level media type accepted by this kind.
    pub fn media_family(self) -> &'static str {
        match self {
            JobKind::Image => "image",
            JobKind::Audio => "audio",
        }
    }

    /// Whether a declared media type (e.g. `image/png; q=1`) belongs to this kind's family.
    pub fn accepts(self, media_type: &str) -> bool {
        let essence = media_type.split(';').next().unwrap_or_default().trim();
        match essence.split_once('/') {
            Some((family, subtype)) => {
                family.eq_ignore_ascii_case(self.media_family()) && !subtype.trim().is_empty()
            }
            None => false,
        }
    }

    /// File name offered when the result is downloaded as plain text.
    pub fn export_file_name(self) -> &'static str {
        match self {
            JobKind::Image => "extracted-text.txt",
            JobKind::Audio => "transcription.txt",
        }
    }
}

/// Lifecycle state of a transcription job.
///
/// A file that failed validation never becomes a `Job`, so the idle state has
/// no variant here: absence from the engine is idle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Validating,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// User-provided file handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub media_type: String,
    /// Raw upload bytes. Never serialized into job snapshots.
    #[serde(skip)]
    pub content: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            media_type: media_type.into(),
            content,
        }
    }

    /// Metadata-only handle, for callers that declare a size without holding the bytes.
    pub fn declared(name: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            media_type: media_type.into(),
            content: Bytes::new(),
        }
    }
}

/// Descriptor attached to a job that ended in [`JobState::Failed`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobError {
    pub kind: String,
    pub message: String,
}

impl JobError {
    pub fn processing_fault(message: impl Into<String>) -> Self {
        Self {
            kind: "processing_fault".to_string(),
            message: message.into(),
        }
    }
}

/// A file-to-text conversion request and its current snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub source: SourceFile,
    pub state: JobState,
    /// Percentage, 0 until running and exactly 100 once succeeded.
    pub progress: u8,
    pub result: Option<String>,
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(kind: JobKind, source: SourceFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source,
            state: JobState::Validating,
            progress: 0,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    // Transitions below return whether the job changed. Terminal jobs never change.

    pub(crate) fn start_running(&mut self) -> bool {
        if self.state != JobState::Validating {
            return false;
        }
        self.state = JobState::Running;
        self.progress = 0;
        true
    }

    pub(crate) fn advance(&mut self, progress: u8) -> bool {
        if self.state != JobState::Running || progress <= self.progress {
            return false;
        }
        self.progress = progress;
        true
    }

    pub(crate) fn succeed(&mut self, text: String) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.state = JobState::Succeeded;
        self.progress = 100;
        self.result = Some(text);
        self.completed_at = Some(Utc::now());
        true
    }

    pub(crate) fn fail(&mut self, error: JobError) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.state = JobState::Failed;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        true
    }

    pub(crate) fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = JobState::Cancelled;
        self.completed_at = Some(Utc::now());
        true
    }
}
