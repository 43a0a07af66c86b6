use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{JobKind, JobState};

/// Query string for listing transcriptions.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub kind: Option<JobKind>,
    /// Case-insensitive search over file name and result text.
    pub q: Option<String>,
}

/// Response for a cancel request.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub job_id: Uuid,
    /// `cancelled`, or `already_terminal` when the job had finished first.
    pub outcome: String,
    pub state: JobState,
}
