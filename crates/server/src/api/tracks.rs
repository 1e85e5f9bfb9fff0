//! Library listing.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::ErrorResponse;
use crate::state::AppState;

/// GET /api/v1/tracks
pub async fn list_tracks(State(state): State<Arc<AppState>>) -> Response {
    match state.library().list_tracks().await {
        Ok(tracks) => Json(tracks).into_response(),
        Err(e) => {
            error!("Failed to list tracks: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}
