//! Download job creation and snapshots.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use pullcast_core::DownloadError;

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDownloadResponse {
    pub job_id: String,
}

/// POST /api/v1/downloads
///
/// Validation is the only synchronous failure; the job id is returned
/// before the download has made any progress.
pub async fn create_download(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDownloadRequest>,
) -> Response {
    let url = request.url.unwrap_or_default();
    match state.downloader().start(&url, request.folder_id).await {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(CreateDownloadResponse { job_id }),
        )
            .into_response(),
        Err(e @ DownloadError::MissingUrl) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start download: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /api/v1/downloads/{id}
pub async fn get_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.registry().get(&id).await {
        Some(job) => Json(job).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Job not found: {id}"))),
        )
            .into_response(),
    }
}
