//! Progress streaming over server-sent events.
//!
//! One observer per job: attaching replaces any earlier connection for
//! the same id. Events flow until the terminal one, after which the
//! stream ends; the job's coordinator tears the registry entry down
//! after the grace window.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::stream;
use tokio::sync::mpsc;
use tracing::debug;

use super::ErrorResponse;
use crate::metrics::{PROGRESS_CONNECTIONS_ACTIVE, PROGRESS_CONNECTIONS_TOTAL};
use crate::state::AppState;

/// Observer channel capacity. Publishes are fire-and-forget, so a slow
/// client drops events rather than stalling the pipeline.
const OBSERVER_BUFFER: usize = 64;

/// Decrements the active-connections gauge when the stream is dropped,
/// whether it ended normally or the client went away.
struct ConnectionGuard;

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        PROGRESS_CONNECTIONS_ACTIVE.dec();
    }
}

/// GET /api/v1/downloads/{id}/progress
pub async fn stream_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let (tx, rx) = mpsc::channel(OBSERVER_BUFFER);
    if let Err(e) = state.registry().attach(&id, tx).await {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response();
    }

    PROGRESS_CONNECTIONS_TOTAL.inc();
    PROGRESS_CONNECTIONS_ACTIVE.inc();
    debug!(job_id = %id, "Progress observer attached");

    let stream = stream::unfold(Some((rx, ConnectionGuard)), |conn| async move {
        let (mut rx, guard) = conn?;
        let event = rx.recv().await?;
        // The terminal event is the last one delivered.
        let next = if event.is_terminal() {
            None
        } else {
            Some((rx, guard))
        };
        match Event::default().json_data(&event) {
            Ok(sse_event) => Some((Ok::<_, Infallible>(sse_event), next)),
            Err(_) => None,
        }
    });

    Sse::new(stream).into_response()
}
