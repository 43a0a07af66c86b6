use std::convert::Infallible;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::job::{Job, JobKind, JobState, SourceFile};
use crate::models::transcription::{CancelResponse, ListQuery};
use crate::routes::error::ApiError;
use crate::services::engine::{CancelOutcome, JobFilter};
use crate::services::export;

/// POST /api/v1/transcriptions/image: upload an image for OCR.
pub async fn submit_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    submit(&state, JobKind::Image, multipart).await
}

/// POST /api/v1/transcriptions/audio: upload audio for speech-to-text.
pub async fn submit_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    submit(&state, JobKind::Audio, multipart).await
}

async fn submit(
    state: &AppState,
    kind: JobKind,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let mut source: Option<SourceFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;
        source = Some(SourceFile::new(name, media_type, data));
    }

    let source = source.ok_or_else(|| ApiError::BadRequest("Missing `file` field".into()))?;
    let job = state.engine.submit(source, kind)?;

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/v1/transcriptions: transcript history, newest first.
pub async fn list_transcriptions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Job>> {
    let filter = JobFilter {
        kind: query.kind,
        search: query.q,
    };
    Json(state.engine.list(&filter))
}

/// GET /api/v1/transcriptions/{id}: current job snapshot.
pub async fn get_transcription(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(state.engine.result(job_id)?))
}

/// POST /api/v1/transcriptions/{id}/cancel
pub async fn cancel_transcription(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let outcome = state.engine.cancel(job_id)?;
    let (outcome, job_state) = match outcome {
        CancelOutcome::Cancelled => ("cancelled", JobState::Cancelled),
        CancelOutcome::AlreadyTerminal(job_state) => ("already_terminal", job_state),
    };
    Ok(Json(CancelResponse {
        job_id,
        outcome: outcome.to_string(),
        state: job_state,
    }))
}

/// DELETE /api/v1/transcriptions/{id}: forget a job, cancelling it if needed.
pub async fn discard_transcription(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.engine.discard(job_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/transcriptions/{id}/events: SSE stream of job snapshots.
///
/// Sends the current snapshot first, then every update until the terminal one.
pub async fn stream_transcription(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let subscription = state.engine.subscribe(job_id)?;
    let initial = subscription.initial().clone();

    let stream = futures::stream::once(async move { initial })
        .chain(subscription.into_stream())
        .map(|job| Ok(job_event(&job)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn job_event(job: &Job) -> Event {
    Event::default()
        .event(job.state.to_string())
        .json_data(job)
        .unwrap_or_else(|e| {
            tracing::error!(job_id = %job.id, error = %e, "Failed to serialize job event");
            serialization_error_event(job.id)
        })
}

/// Sent in place of an update that could not be encoded.
fn serialization_error_event(job_id: Uuid) -> Event {
    Event::default()
        .event("error")
        .data(format!("job {} update could not be serialized", job_id))
}

/// GET /api/v1/transcriptions/{id}/export: download the result as plain text.
pub async fn export_transcription(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.engine.result(job_id)?;
    let export = export::plain_text(&job)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.body,
    ))
}
