use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use fabula_core::models::{CompleteStory, CreateJobInput};

use super::{session, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    pub theme: String,
}

/// Enqueue a generation job and return its handle immediately. The
/// story itself is produced by a detached worker; the only state shared
/// with it is the job row.
pub async fn create_story(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = session::session_id_from_headers(&headers);
    let cookie = session::session_cookie(&session_id);

    let job = state.db.create_job(CreateJobInput {
        session_id: session_id.clone(),
        theme: request.theme.clone(),
    })?;

    let generator = state.generator.clone();
    let job_id = job.job_id;
    tokio::spawn(async move {
        generator.run_job(job_id, &session_id, &request.theme).await;
    });

    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(job)))
}

pub async fn get_complete_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<CompleteStory>, ApiError> {
    Ok(Json(state.db.complete_story(story_id)?))
}
