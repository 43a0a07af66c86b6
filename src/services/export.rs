use crate::models::job::{Job, JobState};

/// Plain-text download of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExport {
    pub file_name: &'static str,
    pub body: String,
}

/// Export the result text of a succeeded job.
pub fn plain_text(job: &Job) -> Result<TextExport, ExportError> {
    match (&job.state, &job.result) {
        (JobState::Succeeded, Some(text)) => Ok(TextExport {
            file_name: job.kind.export_file_name(),
            body: text.clone(),
        }),
        (state, _) => Err(ExportError::NotReady(*state)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Job has no text to export yet (state: {0})")]
    NotReady(JobState),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{JobKind, SourceFile};

    #[test]
    fn test_export_requires_success() {
        let mut job = Job::new(JobKind::Audio, SourceFile::declared("a.mp3", "audio/mpeg", 10));
        assert!(matches!(plain_text(&job), Err(ExportError::NotReady(JobState::Validating))));

        job.start_running();
        job.succeed("hello".to_string());
        let export = plain_text(&job).unwrap();
        assert_eq!(export.file_name, "transcription.txt");
        assert_eq!(export.body, "hello");
    }
}
