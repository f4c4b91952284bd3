//! Core tutoring primitives for DreamARC.
//!
//! This crate owns directive extraction, the speech sanitiser, quiz state,
//! the session store, the backend client and the `Tutor` facade used by the
//! terminal client.

pub mod backend;
pub mod conversation;
pub mod directive;
pub mod dispatcher;
pub mod error;
pub mod persona;
pub mod quiz;
pub mod session;
pub mod speech;
pub mod tutor;

/// Backend trait and HTTP client.
pub use backend::{BackendError, HttpBackend, TutorBackend};
pub use conversation::{Conversation, FALLBACK_REPLY};
/// Directive extraction and routing.
pub use directive::{
    DirectiveRouter, DirectiveSink, Extraction, HANDOVER_MARKER, NoopDirectiveSink, RoutedReply,
    extract_directives,
};
pub use dispatcher::{DispatchError, TurnCompletion, TurnDispatcher};
pub use error::DreamarcCoreError;
pub use persona::{DEFAULT_PERSONA_ID, Persona, find_persona, personas};
pub use quiz::{QuizError, QuizOutcome, QuizProgress, QuizSession};
/// Session state and persistence backends.
pub use session::{
    JsonFileSessionPersistence, MemorySessionPersistence, SessionError, SessionPersistence,
    SessionStore,
};
pub use speech::sanitize_for_speech;
pub use tutor::Tutor;
