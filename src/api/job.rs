use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use fabula_core::models::StoryJob;

use super::{ApiError, AppState};

pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<StoryJob>, ApiError> {
    let job = state
        .db
        .get_job(job_id)?
        .ok_or(fabula_core::Error::NotFound("job"))?;
    Ok(Json(job))
}
