use thiserror::Error;

use crate::engine::events::EventKind;
use crate::engine::record::RecordId;
use crate::engine::render::SampleError;

/// Errors surfaced by the marker engine.
///
/// None of these are fatal to the scene: a failed operation leaves the
/// registry exactly as it was before the call.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// Malformed or missing required fields on a record or an update.
    #[error("validation failed for `{id}`: {reason}")]
    Validation { id: String, reason: String },

    /// The id is still present in the registry.
    #[error("record `{0}` is already registered")]
    DuplicateId(RecordId),

    #[error("record `{0}` is not registered")]
    UnknownRecord(RecordId),

    /// A caller-supplied event handler returned an error or panicked.
    #[error("event handler for `{kind}` failed: {message}")]
    EventHandler { kind: EventKind, message: String },

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarkerError {
    pub fn validation(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::Validation {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkerError>;
