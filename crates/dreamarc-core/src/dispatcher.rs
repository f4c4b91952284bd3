//! Cancellable per-conversation turn dispatch.
//!
//! Each conversation has at most one turn in flight. Submitting a new turn
//! aborts the one it supersedes, and completions for turns that are no
//! longer current are rejected by `finish`.

use crate::backend::BackendError;
use dreamarc_protocol::{ConversationId, TurnId, TutorReply};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Errors returned by turn bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The completion belongs to a superseded or cancelled turn.
    #[error("stale turn {turn_id} for conversation {conversation_id}")]
    Stale {
        conversation_id: ConversationId,
        turn_id: TurnId,
    },
}

/// Finished turn delivered on the completion channel.
#[derive(Debug)]
pub struct TurnCompletion {
    pub conversation_id: ConversationId,
    pub turn_id: TurnId,
    pub result: Result<TutorReply, BackendError>,
}

struct InFlight {
    turn_id: TurnId,
    handle: JoinHandle<()>,
}

/// Task queue keyed by conversation.
#[derive(Clone)]
pub struct TurnDispatcher {
    in_flight: Arc<Mutex<HashMap<ConversationId, InFlight>>>,
    completions: mpsc::Sender<TurnCompletion>,
}

impl TurnDispatcher {
    /// Create a dispatcher and the receiver its completions arrive on.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<TurnCompletion>) {
        let (completions, receiver) = mpsc::channel(buffer);
        (
            Self {
                in_flight: Arc::new(Mutex::new(HashMap::new())),
                completions,
            },
            receiver,
        )
    }

    /// Run `request` as the current turn of `conversation_id`.
    ///
    /// Any turn already in flight for that conversation is aborted. Must be
    /// called from within a tokio runtime.
    pub fn submit<F>(&self, conversation_id: ConversationId, request: F) -> TurnId
    where
        F: Future<Output = Result<TutorReply, BackendError>> + Send + 'static,
    {
        let turn_id = Uuid::new_v4();
        let sender = self.completions.clone();
        let mut in_flight = self.in_flight.lock();
        if let Some(previous) = in_flight.remove(&conversation_id) {
            info!(
                "superseding turn (conversation_id={}, turn_id={})",
                conversation_id, previous.turn_id
            );
            previous.handle.abort();
        }
        let handle = tokio::spawn(async move {
            let result = request.await;
            let completion = TurnCompletion {
                conversation_id,
                turn_id,
                result,
            };
            if sender.send(completion).await.is_err() {
                warn!(
                    "completion receiver dropped (conversation_id={}, turn_id={})",
                    conversation_id, turn_id
                );
            }
        });
        in_flight.insert(conversation_id, InFlight { turn_id, handle });
        debug!(
            "turn submitted (conversation_id={}, turn_id={})",
            conversation_id, turn_id
        );
        turn_id
    }

    /// Abort the in-flight turn of a conversation, if any.
    pub fn cancel(&self, conversation_id: ConversationId) -> bool {
        match self.in_flight.lock().remove(&conversation_id) {
            Some(previous) => {
                info!(
                    "cancelled turn (conversation_id={}, turn_id={})",
                    conversation_id, previous.turn_id
                );
                previous.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_in_flight(&self, conversation_id: ConversationId) -> bool {
        self.in_flight.lock().contains_key(&conversation_id)
    }

    /// Whether `turn_id` is the current turn for its conversation.
    pub fn is_current(&self, conversation_id: ConversationId, turn_id: TurnId) -> bool {
        self.in_flight
            .lock()
            .get(&conversation_id)
            .is_some_and(|entry| entry.turn_id == turn_id)
    }

    /// Clear bookkeeping for a delivered completion.
    ///
    /// Returns `DispatchError::Stale` when the turn was superseded or
    /// cancelled; the caller must then discard the completion.
    pub fn finish(&self, conversation_id: ConversationId, turn_id: TurnId) -> Result<(), DispatchError> {
        let mut in_flight = self.in_flight.lock();
        match in_flight.get(&conversation_id) {
            Some(entry) if entry.turn_id == turn_id => {
                in_flight.remove(&conversation_id);
                debug!(
                    "turn finished (conversation_id={}, turn_id={})",
                    conversation_id, turn_id
                );
                Ok(())
            }
            _ => {
                debug!(
                    "discarding stale completion (conversation_id={}, turn_id={})",
                    conversation_id, turn_id
                );
                Err(DispatchError::Stale {
                    conversation_id,
                    turn_id,
                })
            }
        }
    }

    /// Abort every in-flight turn.
    pub fn shutdown(&self) {
        for (_, entry) in self.in_flight.lock().drain() {
            entry.handle.abort();
        }
    }
}
