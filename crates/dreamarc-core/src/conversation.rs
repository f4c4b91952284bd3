//! One tutoring conversation: persona, history and reply handling.

use crate::directive::{DirectiveRouter, DirectiveSink, HANDOVER_MARKER};
use crate::persona::Persona;
use chrono::{DateTime, Utc};
use dreamarc_protocol::{
    ChatMessage, ConversationId, GraphDirective, MessageContent, Role, StudentId, TutorReply,
    TutorRequest, WireMessage,
};
use log::{debug, info};
use serde_json::Value;
use uuid::Uuid;

/// Assistant message shown when a turn fails.
pub const FALLBACK_REPLY: &str = "Snag hit! Let's try again.";

/// Conversation state owned by the tutor.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    persona: &'static Persona,
    language: String,
    messages: Vec<ChatMessage>,
    latest_graph: Option<GraphDirective>,
    handover_log: Option<String>,
    created_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a conversation seeded with the persona greeting.
    pub fn new(persona: &'static Persona, language: impl Into<String>) -> Self {
        let conversation = Self {
            id: Uuid::new_v4(),
            persona,
            language: language.into(),
            messages: vec![ChatMessage::new(Role::Assistant, persona.greeting)],
            latest_graph: None,
            handover_log: None,
            created_at: Utc::now(),
        };
        info!(
            "created conversation (conversation_id={}, persona={})",
            conversation.id, persona.id
        );
        conversation
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn persona(&self) -> &'static Persona {
        self.persona
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Most recent graph received in this conversation.
    pub fn latest_graph(&self) -> Option<&GraphDirective> {
        self.latest_graph.as_ref()
    }

    /// Last reply that contained a mentor handover report.
    pub fn handover_log(&self) -> Option<&str> {
        self.handover_log.as_deref()
    }

    /// Display text of the latest assistant message.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
            .map(|message| message.content.text())
    }

    /// Record the student's message and build the request for it.
    ///
    /// History is the persona system prompt followed by every message so far.
    pub fn begin_turn(&mut self, text: &str, student_id: Option<StudentId>) -> TutorRequest {
        self.messages.push(ChatMessage::new(Role::User, text));
        let mut history = Vec::with_capacity(self.messages.len() + 1);
        history.push(WireMessage {
            role: Role::System,
            content: self.persona.system_prompt.to_string(),
        });
        history.extend(self.messages.iter().map(ChatMessage::to_wire));
        debug!(
            "turn started (conversation_id={}, history_len={})",
            self.id,
            history.len()
        );
        TutorRequest {
            history,
            student_id,
            persona: self.persona.id.to_string(),
            message: text.to_string(),
            language: self.language.clone(),
        }
    }

    /// Turn a backend reply into an assistant message, routing directives.
    pub fn complete_turn(&mut self, reply: TutorReply, sink: &dyn DirectiveSink) -> &ChatMessage {
        let raw = unwrap_content(&reply.content);
        let routed = DirectiveRouter::new().route(&raw, reply.directives.as_ref(), sink);

        if routed.graph.is_some() {
            self.latest_graph = routed.graph;
        }
        if routed.text.contains(HANDOVER_MARKER) {
            info!("mentor handover report captured (conversation_id={})", self.id);
            self.handover_log = Some(routed.text.clone());
        }

        let content = match routed.quiz {
            Some(quiz) => MessageContent::Structured {
                content: routed.text,
                quiz: Some(quiz),
            },
            None => MessageContent::Text(routed.text),
        };
        self.push_assistant(content)
    }

    /// Append the friendly fallback after a failed turn.
    pub fn fail_turn(&mut self) -> &ChatMessage {
        debug!("turn failed (conversation_id={})", self.id);
        self.push_assistant(MessageContent::Text(FALLBACK_REPLY.to_string()))
    }

    fn push_assistant(&mut self, content: MessageContent) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Role::Assistant, content));
        let index = self.messages.len() - 1;
        &self.messages[index]
    }
}

/// Unwrap content the backend sent as a JSON-encoded `{"content": ...}`.
///
/// Anything else, including JSON without a non-empty string `content`, is
/// returned unchanged.
pub fn unwrap_content(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => match map.get("content") {
            Some(Value::String(inner)) if !inner.is_empty() => inner.clone(),
            _ => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}
