//! Test helpers shared across DreamARC crates.

pub mod backend;
pub mod fixtures;
pub mod sink;

pub use backend::{FailingBackend, ScriptedBackend};
pub use fixtures::{auth_response, graph_reply, quiz_reply, text_reply};
pub use sink::{RecordingSink, SinkEvent};
