//! Application state for the DreamARC TUI.

use crate::event::ActionOutcome;
use dreamarc_core::{
    BackendError, Conversation, DreamarcCoreError, Persona, QuizProgress, QuizSession,
};
use dreamarc_protocol::{
    AtozLog, ChatMessage, ConversationId, Dashboard, DiaryEntry, GraphDirective, MentorMessage,
    Monster, PqWaterfall, RmsqStats, Role,
};
use log::{debug, info};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::cmp::min;

/// Chat roles displayed in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    /// Client-side notices; never sent to the tutor.
    System,
}

/// Single chat entry rendered in the transcript.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
    pub color: Option<Color>,
}

/// Quiz card shown under the transcript.
#[derive(Debug, Clone)]
pub struct QuizCard {
    pub session: QuizSession,
    pub complete: bool,
}

/// Viewer overlay types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKind {
    Diary,
    Monsters,
    Stats,
    MentorBoard,
    Waterfall,
    Atoz,
    Help,
}

/// Top-level application state for the TUI.
pub struct App {
    /// Persona of the active conversation.
    pub persona: &'static Persona,
    pub conversation_id: Option<ConversationId>,
    /// Display name of the signed-in student.
    pub student_name: Option<String>,
    /// Backend the client talks to (shown in header).
    pub api_base: String,
    pub messages: Vec<ChatEntry>,
    pub input: String,
    pub show_slash_commands: bool,
    pub status: String,
    /// Blocking alert; any key dismisses it.
    pub alert: Option<String>,
    /// Latest graph of the conversation.
    pub graph: Option<GraphDirective>,
    pub graph_open: bool,
    pub quiz: Option<QuizCard>,
    pub viewer: Option<ViewerKind>,
    pub viewer_scroll: u16,
    pub viewer_max_scroll: u16,
    pub diary: Vec<DiaryEntry>,
    pub monsters: Vec<Monster>,
    pub dashboard: Option<Dashboard>,
    pub rmsq: Option<RmsqStats>,
    pub mentor_messages: Vec<MentorMessage>,
    pub waterfall: PqWaterfall,
    pub atoz: Option<AtozLog>,
    pub scroll: u16,
    pub auto_scroll: bool,
    pub chat_max_scroll: u16,
}

impl App {
    pub fn new(persona: &'static Persona, api_base: impl Into<String>) -> Self {
        Self {
            persona,
            conversation_id: None,
            student_name: None,
            api_base: api_base.into(),
            messages: Vec::new(),
            input: String::new(),
            show_slash_commands: false,
            status: "idle".to_string(),
            alert: None,
            graph: None,
            graph_open: false,
            quiz: None,
            viewer: None,
            viewer_scroll: 0,
            viewer_max_scroll: 0,
            diary: Vec::new(),
            monsters: Vec::new(),
            dashboard: None,
            rmsq: None,
            mentor_messages: Vec::new(),
            waterfall: PqWaterfall::new(),
            atoz: None,
            scroll: 0,
            auto_scroll: true,
            chat_max_scroll: 0,
        }
    }

    /// Switch to a conversation and show its transcript.
    pub fn load_conversation(&mut self, conversation: &Conversation) {
        info!(
            "active conversation set (conversation_id={}, persona={})",
            conversation.id(),
            conversation.persona().id
        );
        self.persona = conversation.persona();
        self.conversation_id = Some(conversation.id());
        self.messages = conversation
            .messages()
            .iter()
            .map(|message| ChatEntry {
                role: chat_role_for(message.role),
                content: message.content.text().to_string(),
                color: None,
            })
            .collect();
        self.graph = conversation.latest_graph().cloned();
        self.graph_open = false;
        self.quiz = None;
        self.scroll = 0;
        self.auto_scroll = true;
        self.chat_max_scroll = 0;
    }

    pub fn set_student(&mut self, name: Option<String>) {
        self.student_name = name;
    }

    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Append a user-authored message and follow the transcript.
    pub fn push_user_message(&mut self, content: String) {
        self.messages.push(ChatEntry {
            role: ChatRole::User,
            content,
            color: None,
        });
        self.enable_auto_scroll();
    }

    pub fn push_system_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatEntry {
            role: ChatRole::System,
            content: content.into(),
            color: None,
        });
        self.maybe_enable_auto_scroll();
    }

    pub fn push_system_message_colored(&mut self, content: impl Into<String>, color: Color) {
        self.messages.push(ChatEntry {
            role: ChatRole::System,
            content: content.into(),
            color: Some(color),
        });
        self.maybe_enable_auto_scroll();
    }

    /// Append a tutor reply; a quiz on the message opens the quiz card.
    pub fn push_assistant_message(&mut self, message: &ChatMessage) {
        self.messages.push(ChatEntry {
            role: ChatRole::Assistant,
            content: message.content.text().to_string(),
            color: None,
        });
        if let Some(quiz) = message.content.quiz() {
            match QuizSession::new(quiz.clone()) {
                Ok(session) => {
                    debug!("quiz card opened (questions={})", session.len());
                    self.quiz = Some(QuizCard {
                        session,
                        complete: false,
                    });
                }
                Err(err) => debug!("ignoring quiz: {}", err),
            }
        }
        self.maybe_enable_auto_scroll();
    }

    /// Show a graph in the side panel.
    pub fn open_graph(&mut self, graph: GraphDirective) {
        info!("graph panel opened (title={})", graph.title);
        self.graph = Some(graph);
        self.graph_open = true;
    }

    /// Toggle the graph panel; returns false when there is nothing to show.
    pub fn toggle_graph(&mut self) -> bool {
        if self.graph.is_none() {
            self.graph_open = false;
            return false;
        }
        self.graph_open = !self.graph_open;
        true
    }

    /// Answer the current quiz question with a zero-based option index.
    pub fn answer_quiz(&mut self, index: usize) {
        let Some(card) = self.quiz.as_mut() else {
            return;
        };
        if card.complete {
            return;
        }
        match card.session.answer(index) {
            Ok(Some(outcome)) => {
                let verdict = if outcome.correct { "Correct!" } else { "Not quite." };
                self.status = verdict.to_string();
            }
            Ok(None) => {}
            Err(err) => self.status = err.to_string(),
        }
    }

    /// Move past a revealed question.
    pub fn advance_quiz(&mut self) {
        let Some(card) = self.quiz.as_mut() else {
            return;
        };
        if card.complete {
            self.quiz = None;
            return;
        }
        if let QuizProgress::Complete = card.session.advance() {
            card.complete = true;
            let score = format!(
                "Quiz Complete! {}/{} correct",
                card.session.correct_answers(),
                card.session.len()
            );
            self.status = score;
        }
    }

    pub fn close_quiz(&mut self) {
        self.quiz = None;
    }

    pub fn raise_alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("alert raised: {}", message);
        self.alert = Some(message);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Fold a finished background action into the UI.
    pub fn apply_action(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::SignedIn(session) => {
                self.push_system_message_colored(
                    format!("signed in as {}", session.name),
                    success_color(),
                );
                self.student_name = Some(session.name);
                self.status = "idle".to_string();
            }
            ActionOutcome::SpeechWritten(path) => {
                self.push_status(format!("audio saved to {}", path.display()));
            }
            ActionOutcome::Diary(entries) => {
                self.diary = entries;
                self.open_viewer(ViewerKind::Diary);
            }
            ActionOutcome::DiarySaved(reply) => {
                self.push_system_message_colored(
                    format!("journal entry {}", reply.status),
                    success_color(),
                );
            }
            ActionOutcome::Monsters(monsters) => {
                self.monsters = monsters;
                self.open_viewer(ViewerKind::Monsters);
            }
            ActionOutcome::Attack(outcome) => {
                let color = if outcome.defeated() {
                    success_color()
                } else {
                    error_color()
                };
                let mut line = format!("attack {}", outcome.status);
                if outcome.xp_gained > 0 {
                    line.push_str(&format!(" (+{} XP)", outcome.xp_gained));
                }
                if !outcome.message.is_empty() {
                    line.push_str(&format!(": {}", outcome.message));
                }
                self.push_system_message_colored(line, color);
            }
            ActionOutcome::Stats { dashboard, rmsq } => {
                self.dashboard = Some(dashboard);
                self.rmsq = Some(rmsq);
                self.open_viewer(ViewerKind::Stats);
            }
            ActionOutcome::MentorBoard(messages) => {
                self.mentor_messages = messages;
                self.open_viewer(ViewerKind::MentorBoard);
            }
            ActionOutcome::MentorPosted(reply) => {
                self.push_system_message_colored(
                    format!("mentor message {}", reply.status),
                    success_color(),
                );
            }
            ActionOutcome::Waterfall(waterfall) => {
                self.waterfall = waterfall;
                self.open_viewer(ViewerKind::Waterfall);
            }
            ActionOutcome::WaterfallSaved(waterfall) => {
                self.waterfall = waterfall;
                self.push_system_message_colored("waterfall updated", success_color());
                self.open_viewer(ViewerKind::Waterfall);
            }
            ActionOutcome::Atoz(log) => {
                self.atoz = Some(log);
                self.open_viewer(ViewerKind::Atoz);
            }
            ActionOutcome::AtozSaved(log) => {
                self.atoz = Some(log);
                self.push_system_message_colored("AtoZ plan saved", success_color());
                self.open_viewer(ViewerKind::Atoz);
            }
            ActionOutcome::Hint(hint) => {
                let hint = if hint.trim().is_empty() {
                    "No hint this time. Try breaking the question into steps.".to_string()
                } else {
                    hint
                };
                self.push_system_message_colored(format!("💡 Judy: {hint}"), hint_color());
            }
            ActionOutcome::Attempt { topic, outcome } => {
                let color = if outcome.improved() {
                    success_color()
                } else {
                    error_color()
                };
                self.push_system_message_colored(
                    format!(
                        "{topic}: λ {:.2} → {:.2}",
                        outcome.old_lambda, outcome.new_lambda
                    ),
                    color,
                );
            }
        }
    }

    /// Report a failed action: capability problems block, the rest go to chat.
    pub fn apply_action_failure(&mut self, action: &str, error: &DreamarcCoreError) {
        if is_capability_error(error) {
            self.raise_alert(format!("{action}: {error}"));
        } else {
            self.push_system_message_colored(format!("{action} failed: {error}"), error_color());
        }
        self.status = "idle".to_string();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = min(self.scroll.saturating_add(lines), self.chat_max_scroll);
        if self.scroll >= self.chat_max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.chat_max_scroll;
    }

    /// Update scroll bounds after layout changes.
    ///
    /// Snaps to the new bottom only when following the transcript or already
    /// pinned to the bottom.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        let was_at_bottom = self.scroll >= self.chat_max_scroll;
        self.chat_max_scroll = max_scroll;
        if self.auto_scroll || was_at_bottom {
            self.scroll = max_scroll;
            self.auto_scroll = true;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn maybe_enable_auto_scroll(&mut self) {
        if self.auto_scroll {
            self.scroll = self.chat_max_scroll;
        }
    }

    /// Render chat messages into styled lines for the UI.
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        if self.messages.is_empty() {
            lines.push(Line::from(Span::styled(
                " No messages yet. Type a question below to start.",
                Style::default().fg(Color::Rgb(128, 128, 128)),
            )));
            return lines;
        }

        let (r, g, b) = self.persona.theme_rgb();
        let badge = |bg: Color| {
            Style::default()
                .fg(Color::Rgb(10, 10, 10))
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        };
        for (idx, entry) in self.messages.iter().enumerate() {
            let (prefix, prefix_style) = match entry.role {
                ChatRole::User => (" you ".to_string(), badge(Color::Rgb(107, 161, 230))),
                ChatRole::Assistant => (
                    format!(" {} ", self.persona.name),
                    badge(Color::Rgb(r, g, b)),
                ),
                ChatRole::System => (" dreamarc ".to_string(), badge(Color::Rgb(60, 60, 60))),
            };

            let content_style = match (&entry.color, entry.role) {
                (Some(color), _) => Style::default().fg(*color),
                (None, ChatRole::System) => Style::default().fg(Color::Rgb(128, 128, 128)),
                (None, _) => Style::default().fg(Color::Rgb(238, 238, 238)),
            };

            lines.push(Line::from(vec![Span::styled(prefix, prefix_style)]));
            for line in entry.content.lines() {
                lines.push(Line::from(Span::styled(format!(" {line}"), content_style)));
            }

            if idx + 1 < self.messages.len() {
                lines.push(Line::from(Span::raw("")));
            }
        }

        // Trailing pad so the last message scrolls fully into view.
        lines.push(Line::from(Span::raw("")));

        lines
    }

    pub fn open_viewer(&mut self, kind: ViewerKind) {
        self.viewer = Some(kind);
        self.viewer_scroll = 0;
        self.viewer_max_scroll = 0;
    }

    pub fn close_viewer(&mut self) {
        self.viewer = None;
        self.viewer_scroll = 0;
        self.viewer_max_scroll = 0;
    }

    pub fn viewer_scroll_up(&mut self, lines: u16) {
        self.viewer_scroll = self.viewer_scroll.saturating_sub(lines);
    }

    pub fn viewer_scroll_down(&mut self, lines: u16) {
        self.viewer_scroll = min(
            self.viewer_scroll.saturating_add(lines),
            self.viewer_max_scroll,
        );
    }

    pub fn update_viewer_scroll_bounds(&mut self, max_scroll: u16) {
        self.viewer_max_scroll = max_scroll;
        self.viewer_scroll = self.viewer_scroll.min(max_scroll);
    }
}

/// Errors shown as a blocking alert instead of a chat line.
pub fn is_capability_error(error: &DreamarcCoreError) -> bool {
    matches!(
        error,
        DreamarcCoreError::SpeechUnavailable(_)
            | DreamarcCoreError::UnknownPersona(_)
            | DreamarcCoreError::UnknownMetric(_)
            | DreamarcCoreError::NotSignedIn
            | DreamarcCoreError::MissingStudentId
            | DreamarcCoreError::Backend(BackendError::Unsupported(_))
            | DreamarcCoreError::Backend(BackendError::InvalidMentorId(_))
    )
}

fn chat_role_for(role: Role) -> ChatRole {
    match role {
        Role::Assistant => ChatRole::Assistant,
        Role::User => ChatRole::User,
        Role::System => ChatRole::System,
    }
}

pub fn hint_color() -> Color {
    Color::Rgb(229, 192, 123)
}

pub fn success_color() -> Color {
    Color::Rgb(120, 220, 140)
}

pub fn error_color() -> Color {
    Color::Rgb(255, 110, 110)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamarc_core::find_persona;
    use dreamarc_protocol::{
        LambdaAttemptOutcome, MessageContent, QuizDirective, QuizQuestion, StatusReply,
        WaterfallEntry,
    };
    use pretty_assertions::assert_eq;

    fn app() -> App {
        App::new(find_persona("samie").expect("samie"), "http://localhost")
    }

    fn quiz_message() -> ChatMessage {
        ChatMessage::new(
            Role::Assistant,
            MessageContent::Structured {
                content: "Check:".to_string(),
                quiz: Some(QuizDirective(vec![QuizQuestion {
                    question: "1 + 1?".to_string(),
                    options: vec!["1".to_string(), "2".to_string()],
                    correct_index: 1,
                    explanation: "One plus one is two.".to_string(),
                }])),
            },
        )
    }

    #[test]
    fn quiz_message_opens_card_and_completes() {
        let mut app = app();
        app.push_assistant_message(&quiz_message());
        assert_eq!(app.messages[0].content, "Check:");

        app.answer_quiz(0);
        assert_eq!(app.status, "Not quite.");
        app.answer_quiz(1);
        let card = app.quiz.as_ref().expect("card");
        assert_eq!(card.session.revealed().map(|o| o.selected_index), Some(0));

        app.advance_quiz();
        assert_eq!(app.status, "Quiz Complete! 0/1 correct");
        assert!(app.quiz.as_ref().expect("card").complete);
        app.advance_quiz();
        assert!(app.quiz.is_none());
    }

    #[test]
    fn graph_toggle_needs_a_graph() {
        let mut app = app();
        assert!(!app.toggle_graph());
        app.open_graph(GraphDirective {
            title: "y = x".to_string(),
            data: Vec::new(),
        });
        assert!(app.graph_open);
        assert!(app.toggle_graph());
        assert!(!app.graph_open);
    }

    #[test]
    fn capability_failures_raise_alerts() {
        let mut app = app();
        app.apply_action_failure(
            "speech",
            &DreamarcCoreError::SpeechUnavailable("no speech output path configured".into()),
        );
        assert_eq!(
            app.alert.as_deref(),
            Some("speech: speech unavailable: no speech output path configured")
        );

        app.dismiss_alert();
        app.apply_action_failure(
            "diary",
            &DreamarcCoreError::Backend(BackendError::Transport("refused".into())),
        );
        assert!(app.alert.is_none());
        assert_eq!(app.messages.last().expect("line").role, ChatRole::System);
    }

    #[test]
    fn journal_save_is_reported_in_chat() {
        let mut app = app();
        app.apply_action(ActionOutcome::DiarySaved(StatusReply {
            status: "saved".to_string(),
        }));
        assert_eq!(app.messages[0].content, "journal entry saved");
    }

    #[test]
    fn saved_waterfall_refreshes_viewer() {
        let mut app = app();
        let mut waterfall = PqWaterfall::new();
        waterfall.insert(
            "Review".to_string(),
            vec![WaterfallEntry::new(50.0), WaterfallEntry::new(3.0)],
        );
        app.apply_action(ActionOutcome::WaterfallSaved(waterfall));
        assert_eq!(app.viewer, Some(ViewerKind::Waterfall));
        assert_eq!(app.waterfall["Review"].len(), 2);
        assert_eq!(app.messages[0].content, "waterfall updated");
    }

    #[test]
    fn hint_is_voiced_by_judy() {
        let mut app = app();
        app.apply_action(ActionOutcome::Hint("Rise over run.".to_string()));
        assert_eq!(app.messages[0].content, "💡 Judy: Rise over run.");
        assert_eq!(app.messages[0].color, Some(hint_color()));

        app.apply_action(ActionOutcome::Attempt {
            topic: "Slopes".to_string(),
            outcome: LambdaAttemptOutcome {
                old_lambda: 1.0,
                new_lambda: 2.5,
            },
        });
        assert_eq!(app.messages[1].content, "Slopes: λ 1.00 → 2.50");
        assert_eq!(app.messages[1].color, Some(error_color()));
    }
}
