//! Error types for the core tutoring crate.

use crate::backend::BackendError;
use crate::dispatcher::DispatchError;
use crate::session::SessionError;
use dreamarc_protocol::ConversationId;
use thiserror::Error;

/// Errors returned by `Tutor` operations.
#[derive(Debug, Error)]
pub enum DreamarcCoreError {
    /// Conversation id is unknown to the tutor.
    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
    /// Persona id is not one of the built-in personas.
    #[error("unknown persona: {0}")]
    UnknownPersona(String),
    /// Metric is not one of the tracked PQ metrics.
    #[error("unknown PQ metric: {0}")]
    UnknownMetric(String),
    /// The operation needs a signed-in student.
    #[error("not signed in")]
    NotSignedIn,
    /// The signed-in session carries no student id.
    #[error("session has no student id")]
    MissingStudentId,
    /// Speech output is not configured or the backend returned no audio.
    #[error("speech unavailable: {0}")]
    SpeechUnavailable(String),
    /// Backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// Session persistence failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Turn bookkeeping failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
