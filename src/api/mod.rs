//! HTTP API: story creation, story retrieval, job polling.

mod job;
mod session;
mod story;

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use fabula_core::Database;

use crate::config::Config;
use crate::generator::StoryGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub generator: StoryGenerator,
}

pub fn create_router(db: Database, generator: StoryGenerator, config: &Config) -> Router {
    let api = Router::new()
        .route("/stories/create", post(story::create_story))
        .route("/stories/{story_id}/complete", get(story::get_complete_story))
        .route("/jobs/{job_id}", get(job::get_job_status))
        .with_state(AppState { db, generator });

    Router::new()
        .nest(&config.api_prefix, api)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

/// Maps core errors onto response status codes at the transport
/// boundary.
pub struct ApiError(fabula_core::Error);

impl From<fabula_core::Error> for ApiError {
    fn from(error: fabula_core::Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            fabula_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = Json(serde_json::json!({ "detail": self.0.to_string() }));
        (status, body).into_response()
    }
}
