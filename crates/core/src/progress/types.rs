//! Progress event types shared between the parser, registry and API.

use serde::{Deserialize, Serialize};

/// A named point in a job's progress lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Initializing,
    Fetching,
    Downloading,
    Processing,
    Finalizing,
    Saving,
    Complete,
    Error,
}

impl Stage {
    /// Whether this stage ends the job's timeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }

    /// Stable string form used in logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initializing => "initializing",
            Stage::Fetching => "fetching",
            Stage::Downloading => "downloading",
            Stage::Processing => "processing",
            Stage::Finalizing => "finalizing",
            Stage::Saving => "saving",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }
}

/// One entry in a job's progress timeline. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
    /// Reported percentage, 0-100.
    pub percent: u8,
    /// Resolved title, present once the external tool has announced it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_title: Option<String>,
    /// Detail for terminal error events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// A non-terminal stage event.
    pub fn stage(stage: Stage, message: impl Into<String>, percent: u8) -> Self {
        Self {
            stage,
            message: message.into(),
            percent,
            video_title: None,
            error: None,
        }
    }

    /// A terminal error event. Percent resets to 0, the single allowed
    /// decrease in a job's timeline.
    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            stage: Stage::Error,
            message: message.into(),
            percent: 0,
            video_title: None,
            error: Some(detail.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.video_title = Some(title.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}
