//! Wire protocol types for DreamARC chat messages, directives, and backend calls.

mod backend;
mod directive;

pub use backend::{
    AtozLog, AtozUpdate, AttackOutcome, AttackRequest, AuthResponse, AuthSession, Dashboard,
    DiaryEntry, DiarySaveRequest, JudyHelpRequest, JudyHint, LambdaAttemptOutcome,
    LambdaAttemptRequest, LoginRequest, MentorMessage, MentorMessageRequest, Monster,
    PQ_METRICS, PqWaterfall, RegisterRequest, RmsqInsight, RmsqPoint, RmsqStats, SpeakRequest,
    StatusReply, TutorLog, TutorReply, TutorRequest, WaterfallEntry, WaterfallUpdate,
    WireMessage, canonical_metric,
};
pub use directive::{DirectiveEnvelope, GraphDirective, GraphPoint, QuizDirective, QuizQuestion};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation.
pub type ConversationId = Uuid;
/// Unique identifier for a single request/response turn.
pub type TurnId = Uuid;
/// Backend identifier for a student.
pub type StudentId = i64;

/// Speaker role for a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona instructions sent ahead of the history.
    System,
    /// Student-authored message.
    User,
    /// Tutor-authored message.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Body of a chat message: plain text, or text with an attached quiz card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain Markdown text.
    Text(String),
    /// Display text plus structured payloads rendered in place of plain text.
    Structured {
        content: String,
        #[serde(default, rename = "quiz_data", skip_serializing_if = "Option::is_none")]
        quiz: Option<QuizDirective>,
    },
}

impl MessageContent {
    /// Display text regardless of representation.
    pub fn text(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Structured { content, .. } => content,
        }
    }

    /// Attached quiz, if any.
    pub fn quiz(&self) -> Option<&QuizDirective> {
        match self {
            MessageContent::Text(_) => None,
            MessageContent::Structured { quiz, .. } => quiz.as_ref(),
        }
    }

    /// Render the content the way the backend expects it in history entries.
    ///
    /// Structured content is sent as its JSON encoding.
    pub fn to_wire_string(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Structured { .. } => {
                serde_json::to_string(self).unwrap_or_else(|_| self.text().to_string())
            }
        }
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

/// Message stored in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: MessageContent,
    /// Timestamp for the message.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Convert to the `{role, content}` pair sent in tutor requests.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.to_wire_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn structured_content_is_stringified_for_the_wire() {
        let quiz = QuizDirective(vec![QuizQuestion {
            question: "2+2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            correct_index: 1,
            explanation: "Count it out.".to_string(),
        }]);
        let message = ChatMessage::new(
            Role::Assistant,
            MessageContent::Structured {
                content: "Try this".to_string(),
                quiz: Some(quiz),
            },
        );
        let wire = message.to_wire();
        assert_eq!(wire.role, Role::Assistant);
        let decoded: serde_json::Value = serde_json::from_str(&wire.content).expect("json");
        assert_eq!(decoded["content"], json!("Try this"));
        assert_eq!(decoded["quiz_data"][0]["correct_index"], json!(1));
    }

    #[test]
    fn plain_text_content_passes_through() {
        let message = ChatMessage::new(Role::User, "what is a slope?");
        assert_eq!(message.to_wire().content, "what is a slope?");
        assert_eq!(message.content.quiz(), None);
    }

    #[test]
    fn message_content_decodes_both_shapes() {
        let text: MessageContent = serde_json::from_value(json!("hi")).expect("text");
        assert_eq!(text, MessageContent::Text("hi".to_string()));
        let structured: MessageContent =
            serde_json::from_value(json!({ "content": "hello" })).expect("structured");
        assert_eq!(structured.text(), "hello");
        assert_eq!(structured.quiz(), None);
    }
}
