pub mod downloads;
pub mod handlers;
pub mod progress;
pub mod routes;
pub mod tracks;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by all API endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
