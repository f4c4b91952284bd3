//! Library entry point for the DreamARC TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a pre-configured [`Tutor`].

mod app;
mod client;
mod event;
mod graph_slot;
mod ui;

pub use graph_slot::GraphSlot;

use anyhow::anyhow;
use app::{App, ViewerKind};
use client::TutorClient;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use dreamarc_core::{DreamarcCoreError, TurnCompletion, Tutor};
use event::{AppEvent, AtozEdit};
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Supported slash commands in the TUI input box.
#[derive(Debug, Clone, PartialEq)]
enum SlashCommand {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
        grade: Option<String>,
    },
    Logout,
    Persona(String),
    New,
    Graph,
    Speak,
    Diary,
    Journal(String),
    Monsters,
    Attack {
        monster_id: i64,
        answer: String,
    },
    Hint {
        monster_id: i64,
        answer: String,
    },
    Waterfall,
    WaterfallEntry {
        metric: String,
        change: f64,
    },
    Atoz,
    EditAtoz(AtozEdit),
    Practice {
        topic: String,
        correct: bool,
        latency_secs: f64,
    },
    MentorBoard,
    Mentor {
        mentor_id: String,
        message: String,
    },
    Stats,
    Help,
}

/// Configuration for the DreamARC TUI session.
#[derive(Debug, Clone, Default)]
pub struct TuiConfig {
    /// Persona for the first conversation; the configured default when unset.
    pub persona: Option<String>,
}

/// Launch the DreamARC TUI against a pre-configured tutor.
///
/// `completions` is the receiver returned alongside the tutor. The caller
/// initializes logging before calling `run`; log output must not go to the
/// terminal the UI draws on.
///
/// # Errors
/// Returns an error if terminal setup, conversation creation, or the event
/// loop fails.
pub async fn run(
    tutor: Arc<Tutor>,
    completions: mpsc::Receiver<TurnCompletion>,
    config: TuiConfig,
) -> anyhow::Result<()> {
    let conversation_id = tutor.open_conversation(config.persona.as_deref())?;
    let conversation = tutor
        .conversation(conversation_id)
        .ok_or_else(|| anyhow!("conversation {conversation_id} vanished"))?;

    let (tx, mut rx) = mpsc::channel(256);
    let client = TutorClient::new(tutor.clone(), tx.clone());

    let mut app = App::new(conversation.persona(), tutor.config().backend.base_url.clone());
    app.load_conversation(&conversation);
    app.set_student(tutor.current_session().map(|session| session.name));
    if app.student_name.is_none() {
        app.push_system_message("not signed in; use /login <user> <pass> to save progress");
    }

    let mut terminal = setup_terminal()?;
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());
    spawn_completion_forwarder(completions, tx.clone());

    let result = event_loop(&mut terminal, &mut rx, &client, &mut app).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    rx: &mut mpsc::Receiver<AppEvent>,
    client: &TutorClient,
    app: &mut App,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        let event = rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("event channel closed unexpectedly"))?;
        if handle_app_event(event, client, app)? {
            break;
        }
    }
    Ok(())
}

/// Fold a finished turn into its conversation and refresh the chat when it
/// belongs to the open one, opening the graph panel for a routed graph.
fn apply_turn(completion: TurnCompletion, client: &TutorClient, app: &mut App) {
    let is_active = app.conversation_id == Some(completion.conversation_id);
    let slot = GraphSlot::new();
    match client.tutor().apply_completion(completion, &slot) {
        Ok(Some(message)) if is_active => {
            app.push_assistant_message(&message);
            if let Some(graph) = slot.take() {
                app.open_graph(graph);
            }
            app.push_status("idle");
        }
        Ok(_) => {}
        Err(err) => warn!("failed to apply turn: {}", err),
    }
}

/// Dispatch a UI event and return true when the app should exit.
fn handle_app_event(
    event: AppEvent,
    client: &TutorClient,
    app: &mut App,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => handle_input(key, client, app),
        AppEvent::Turn(completion) => {
            apply_turn(completion, client, app);
            Ok(false)
        }
        AppEvent::Action(outcome) => {
            app.apply_action(outcome);
            Ok(false)
        }
        AppEvent::ActionFailed { action, error } => {
            app.apply_action_failure(action, &error);
            Ok(false)
        }
        AppEvent::Scroll(delta) => {
            if app.viewer.is_some() {
                if delta < 0 {
                    app.viewer_scroll_up((-delta) as u16);
                } else if delta > 0 {
                    app.viewer_scroll_down(delta as u16);
                }
            } else if delta < 0 {
                app.scroll_up((-delta) as u16);
            } else if delta > 0 {
                app.scroll_down(delta as u16);
            }
            Ok(false)
        }
        AppEvent::Tick => Ok(false),
    }
}

/// Handle keyboard input and dispatch actions.
fn handle_input(key: KeyEvent, client: &TutorClient, app: &mut App) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }
    if app.alert.is_some() {
        app.dismiss_alert();
        return Ok(false);
    }
    if key.code == KeyCode::Esc {
        if app.viewer.is_some() {
            app.close_viewer();
            return Ok(false);
        }
        if app.show_slash_commands {
            app.show_slash_commands = false;
            app.input.clear();
            return Ok(false);
        }
        if app.quiz.is_some() {
            app.close_quiz();
            return Ok(false);
        }
        return Ok(true);
    }

    if let Some(kind) = app.viewer {
        return handle_viewer_input(key, kind, app);
    }

    if app.quiz.is_some() && app.input.is_empty() && handle_quiz_input(key, app) {
        return Ok(false);
    }

    handle_default_input(key, client, app)
}

/// Quiz keys apply only while the input box is empty; returns true when consumed.
fn handle_quiz_input(key: KeyEvent, app: &mut App) -> bool {
    match key.code {
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            app.answer_quiz(index);
            true
        }
        KeyCode::Enter => {
            let revealed = app
                .quiz
                .as_ref()
                .is_some_and(|card| card.complete || card.session.revealed().is_some());
            if revealed {
                app.advance_quiz();
            }
            revealed
        }
        _ => false,
    }
}

/// Handle keyboard input while a viewer panel is open.
fn handle_viewer_input(key: KeyEvent, _kind: ViewerKind, app: &mut App) -> anyhow::Result<bool> {
    match key.code {
        KeyCode::Up => app.viewer_scroll_up(1),
        KeyCode::Down => app.viewer_scroll_down(1),
        KeyCode::PageUp => app.viewer_scroll_up(5),
        KeyCode::PageDown => app.viewer_scroll_down(5),
        KeyCode::Home => app.viewer_scroll_up(u16::MAX),
        KeyCode::End => app.viewer_scroll_down(u16::MAX),
        _ => {}
    }
    Ok(false)
}

/// Handle keyboard input in the default (non-viewer) state.
fn handle_default_input(
    key: KeyEvent,
    client: &TutorClient,
    app: &mut App,
) -> anyhow::Result<bool> {
    match key.code {
        KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !app.toggle_graph() {
                app.push_status("no graph yet");
            }
        }
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let persona = app.persona.id;
            open_conversation(client, app, persona);
        }
        KeyCode::PageUp => app.scroll_up(5),
        KeyCode::PageDown => app.scroll_down(5),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.enable_auto_scroll(),
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                app.show_slash_commands = false;
                return Ok(false);
            }
            app.show_slash_commands = false;
            if app.input.trim_start().starts_with('/') {
                let command = std::mem::take(&mut app.input);
                if let Err(err) = handle_slash_command(client, app, command) {
                    app.push_system_message(err);
                }
            } else {
                send_message(client, app);
            }
        }
        KeyCode::Backspace => {
            app.input.pop();
            app.show_slash_commands = app.input.trim_start().starts_with('/');
        }
        KeyCode::Char(ch) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                app.input.push(ch);
                app.show_slash_commands = app.input.trim_start().starts_with('/');
            }
        }
        _ => {}
    }

    Ok(false)
}

/// Replace the active conversation with a fresh one for `persona_id`.
fn open_conversation(client: &TutorClient, app: &mut App, persona_id: &str) {
    let tutor = client.tutor();
    let opened = tutor.open_conversation(Some(persona_id)).and_then(|id| {
        tutor
            .conversation(id)
            .ok_or(DreamarcCoreError::UnknownConversation(id))
    });
    match opened {
        Ok(conversation) => {
            if let Some(previous) = app.conversation_id {
                tutor.close_conversation(previous);
            }
            app.load_conversation(&conversation);
            app.push_status("idle");
        }
        Err(err) => app.apply_action_failure("persona", &err),
    }
}

/// Handle slash commands entered in the input box.
fn handle_slash_command(client: &TutorClient, app: &mut App, input: String) -> Result<(), String> {
    let command = parse_slash_command(&input)?;
    let Some(command) = command else {
        return Ok(());
    };
    debug!("handling slash command");
    match command {
        SlashCommand::Login { username, password } => {
            app.push_status("signing in");
            client.login(username, password);
        }
        SlashCommand::Register {
            username,
            password,
            grade,
        } => {
            app.push_status("registering");
            client.register(username, password, grade);
        }
        SlashCommand::Logout => {
            client.tutor().logout().map_err(|err| err.to_string())?;
            app.set_student(None);
            app.push_system_message("signed out");
        }
        SlashCommand::Persona(persona_id) => open_conversation(client, app, &persona_id),
        SlashCommand::New => {
            let persona = app.persona.id;
            open_conversation(client, app, persona);
        }
        SlashCommand::Graph => {
            if !app.toggle_graph() {
                app.raise_alert("no graph yet; ask the tutor to plot something");
            }
        }
        SlashCommand::Speak => {
            let conversation_id = app
                .conversation_id
                .ok_or_else(|| "no active conversation".to_string())?;
            app.push_status("speaking");
            client.speak(conversation_id);
        }
        SlashCommand::Diary => client.diary(),
        SlashCommand::Journal(content) => client.save_diary(content),
        SlashCommand::Monsters => client.monsters(),
        SlashCommand::Attack { monster_id, answer } => client.attack(monster_id, answer),
        SlashCommand::Hint { monster_id, answer } => {
            app.push_status("asking Judy");
            client.hint(monster_id, answer);
        }
        SlashCommand::Waterfall => client.waterfall(),
        SlashCommand::WaterfallEntry { metric, change } => {
            client.add_waterfall_entry(metric, change)
        }
        SlashCommand::Atoz => client.atoz(),
        SlashCommand::EditAtoz(edit) => client.edit_atoz(edit),
        SlashCommand::Practice {
            topic,
            correct,
            latency_secs,
        } => client.record_attempt(topic, correct, latency_secs),
        SlashCommand::MentorBoard => client.mentor_board(),
        SlashCommand::Mentor { mentor_id, message } => {
            client.post_mentor_message(mentor_id, message)
        }
        SlashCommand::Stats => client.stats(),
        SlashCommand::Help => app.open_viewer(ViewerKind::Help),
    }
    Ok(())
}

/// Text after the first `skip` whitespace-separated words, trimmed.
fn rest_after(input: &str, skip: usize) -> &str {
    let mut rest = input.trim();
    for _ in 0..skip {
        rest = rest
            .split_once(char::is_whitespace)
            .map_or("", |(_, tail)| tail)
            .trim_start();
    }
    rest.trim_end()
}

/// Parse a slash command from the input line.
fn parse_slash_command(input: &str) -> Result<Option<SlashCommand>, String> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(None);
    }
    let mut parts = trimmed.trim_start_matches('/').split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    match command.to_lowercase().as_str() {
        "login" => match (parts.next(), parts.next()) {
            (Some(username), Some(password)) => Ok(Some(SlashCommand::Login {
                username: username.to_string(),
                password: password.to_string(),
            })),
            _ => Err("usage: /login <username> <password>".to_string()),
        },
        "register" => match (parts.next(), parts.next()) {
            (Some(username), Some(password)) => {
                let grade = rest_after(trimmed, 3);
                Ok(Some(SlashCommand::Register {
                    username: username.to_string(),
                    password: password.to_string(),
                    grade: (!grade.is_empty()).then(|| grade.to_string()),
                }))
            }
            _ => Err("usage: /register <username> <password> [grade]".to_string()),
        },
        "logout" => Ok(Some(SlashCommand::Logout)),
        "persona" => match parts.next() {
            Some(id) => Ok(Some(SlashCommand::Persona(id.to_lowercase()))),
            None => Err("usage: /persona <id>".to_string()),
        },
        "new" => Ok(Some(SlashCommand::New)),
        "graph" => Ok(Some(SlashCommand::Graph)),
        "speak" => Ok(Some(SlashCommand::Speak)),
        "diary" => Ok(Some(SlashCommand::Diary)),
        "journal" => {
            let content = rest_after(trimmed, 1);
            if content.is_empty() {
                return Err("usage: /journal <text>".to_string());
            }
            Ok(Some(SlashCommand::Journal(content.to_string())))
        }
        "monsters" => Ok(Some(SlashCommand::Monsters)),
        "attack" => {
            let usage = || "usage: /attack <monster_id> [--hint] <answer>".to_string();
            let monster_id = parts
                .next()
                .ok_or_else(usage)?
                .parse::<i64>()
                .map_err(|_| "invalid monster id".to_string())?;
            if parts.next() == Some("--hint") {
                return Ok(Some(SlashCommand::Hint {
                    monster_id,
                    answer: rest_after(trimmed, 3).to_string(),
                }));
            }
            let answer = rest_after(trimmed, 2);
            if answer.is_empty() {
                return Err(usage());
            }
            Ok(Some(SlashCommand::Attack {
                monster_id,
                answer: answer.to_string(),
            }))
        }
        "waterfall" => {
            let args = rest_after(trimmed, 1);
            if args.is_empty() {
                return Ok(Some(SlashCommand::Waterfall));
            }
            let usage = || "usage: /waterfall [<metric> <change>]".to_string();
            let (metric, change) = args.rsplit_once(char::is_whitespace).ok_or_else(usage)?;
            let change = change
                .parse::<f64>()
                .ok()
                .filter(|change| change.is_finite())
                .ok_or_else(|| format!("invalid change: {change}"))?;
            Ok(Some(SlashCommand::WaterfallEntry {
                metric: metric.trim().to_string(),
                change,
            }))
        }
        "atoz" => parse_atoz(trimmed),
        "practice" => {
            let usage = || "usage: /practice <right|wrong> <seconds> <topic>".to_string();
            let correct = match parts.next().map(str::to_lowercase).as_deref() {
                Some("right") | Some("correct") => true,
                Some("wrong") | Some("incorrect") => false,
                _ => return Err(usage()),
            };
            let latency_secs = parts
                .next()
                .and_then(|secs| secs.parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .ok_or_else(usage)?;
            let topic = rest_after(trimmed, 3);
            if topic.is_empty() {
                return Err(usage());
            }
            Ok(Some(SlashCommand::Practice {
                topic: topic.to_string(),
                correct,
                latency_secs,
            }))
        }
        "mentor" => match parts.next() {
            None => Ok(Some(SlashCommand::MentorBoard)),
            Some(mentor_id) => {
                let message = rest_after(trimmed, 2);
                if message.is_empty() {
                    return Err("usage: /mentor <mentor_id> <message>".to_string());
                }
                Ok(Some(SlashCommand::Mentor {
                    mentor_id: mentor_id.to_string(),
                    message: message.to_string(),
                }))
            }
        },
        "stats" => Ok(Some(SlashCommand::Stats)),
        "help" => Ok(Some(SlashCommand::Help)),
        _ => Err(format!("unknown command: {command}")),
    }
}

/// `/atoz`, `/atoz plan <text>` or `/atoz <now> <future> <goal>`.
fn parse_atoz(trimmed: &str) -> Result<Option<SlashCommand>, String> {
    let usage = || "usage: /atoz [<now> <future> <goal> | plan <text>]".to_string();
    let mut parts = trimmed.split_whitespace().skip(1);
    let Some(first) = parts.next() else {
        return Ok(Some(SlashCommand::Atoz));
    };
    if first.eq_ignore_ascii_case("plan") {
        let plan = rest_after(trimmed, 2);
        if plan.is_empty() {
            return Err(usage());
        }
        return Ok(Some(SlashCommand::EditAtoz(AtozEdit::Plan(plan.to_string()))));
    }
    let score = |value: Option<&str>| {
        value
            .and_then(|value| value.trim_end_matches('%').parse::<i64>().ok())
            .ok_or_else(usage)
    };
    let current_score = score(Some(first))?;
    let future_score = score(parts.next())?;
    let future_goal = rest_after(trimmed, 3);
    if future_goal.is_empty() {
        return Err(usage());
    }
    Ok(Some(SlashCommand::EditAtoz(AtozEdit::Scores {
        current_score,
        future_score,
        future_goal: future_goal.to_string(),
    })))
}

/// Send the input box to the active conversation.
fn send_message(client: &TutorClient, app: &mut App) {
    let Some(conversation_id) = app.conversation_id else {
        app.push_status("no active conversation");
        return;
    };
    let prompt = std::mem::take(&mut app.input);
    info!(
        "sending message (conversation_id={}, prompt_len={})",
        conversation_id,
        prompt.len()
    );
    app.push_user_message(prompt.clone());
    match client.tutor().send(conversation_id, &prompt) {
        Ok(_) => app.push_status("thinking"),
        Err(err) => app.apply_action_failure("send", &err),
    }
}

/// Forward tutor turn completions into the UI loop.
fn spawn_completion_forwarder(
    mut completions: mpsc::Receiver<TurnCompletion>,
    sender: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(completion) = completions.recv().await {
            if sender.send(AppEvent::Turn(completion)).await.is_err() {
                break;
            }
        }
        debug!("completion channel closed");
    });
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    match event {
                        CrosstermEvent::Key(key) => {
                            let _ = sender.send(AppEvent::Input(key)).await;
                        }
                        CrosstermEvent::Mouse(mouse) => {
                            let lines = if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                                MOUSE_SCROLL_LINES.saturating_mul(2)
                            } else {
                                MOUSE_SCROLL_LINES
                            };
                            match mouse.kind {
                                MouseEventKind::ScrollUp => {
                                    let _ = sender.send(AppEvent::Scroll(-lines)).await;
                                }
                                MouseEventKind::ScrollDown => {
                                    let _ = sender.send(AppEvent::Scroll(lines)).await;
                                }
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{App, AtozEdit, SlashCommand, TutorClient, apply_turn, parse_slash_command};
    use dreamarc_config::DreamarcConfig;
    use dreamarc_core::{SessionStore, Tutor, find_persona};
    use dreamarc_test_utils::{ScriptedBackend, graph_reply};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[test]
    fn attack_hint_flag_asks_for_a_hint() {
        assert_eq!(
            parse_slash_command("/attack 3 --hint 2x + 1"),
            Ok(Some(SlashCommand::Hint {
                monster_id: 3,
                answer: "2x + 1".to_string(),
            }))
        );
        assert_eq!(
            parse_slash_command("/attack 3 --hint"),
            Ok(Some(SlashCommand::Hint {
                monster_id: 3,
                answer: String::new(),
            }))
        );
        assert_eq!(
            parse_slash_command("/attack 3"),
            Err("usage: /attack <monster_id> [--hint] <answer>".to_string())
        );
    }

    #[test]
    fn waterfall_metric_may_contain_spaces() {
        assert_eq!(parse_slash_command("/waterfall"), Ok(Some(SlashCommand::Waterfall)));
        assert_eq!(
            parse_slash_command("/waterfall Note Taking -5"),
            Ok(Some(SlashCommand::WaterfallEntry {
                metric: "Note Taking".to_string(),
                change: -5.0,
            }))
        );
        assert_eq!(
            parse_slash_command("/waterfall Homework lots"),
            Err("invalid change: lots".to_string())
        );
        assert_eq!(
            parse_slash_command("/waterfall 5"),
            Err("usage: /waterfall [<metric> <change>]".to_string())
        );
    }

    #[test]
    fn atoz_edits_scores_or_plan() {
        assert_eq!(parse_slash_command("/atoz"), Ok(Some(SlashCommand::Atoz)));
        assert_eq!(
            parse_slash_command("/atoz 55% 90 Become an engineer"),
            Ok(Some(SlashCommand::EditAtoz(AtozEdit::Scores {
                current_score: 55,
                future_score: 90,
                future_goal: "Become an engineer".to_string(),
            })))
        );
        assert_eq!(
            parse_slash_command("/atoz plan Flashcards every night"),
            Ok(Some(SlashCommand::EditAtoz(AtozEdit::Plan(
                "Flashcards every night".to_string()
            ))))
        );
        assert!(parse_slash_command("/atoz 55 90").is_err());
        assert!(parse_slash_command("/atoz plan").is_err());
    }

    #[test]
    fn practice_needs_outcome_latency_and_topic() {
        assert_eq!(
            parse_slash_command("/practice right 12.5 Linear functions"),
            Ok(Some(SlashCommand::Practice {
                topic: "Linear functions".to_string(),
                correct: true,
                latency_secs: 12.5,
            }))
        );
        assert!(parse_slash_command("/practice maybe 3 Slopes").is_err());
        assert!(parse_slash_command("/practice wrong -1 Slopes").is_err());
        assert!(parse_slash_command("/practice wrong 4").is_err());
    }

    async fn graph_turn(active: bool) -> App {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply(graph_reply("Here:", "y = 2x"));
        let (tutor, mut completions) =
            Tutor::new(DreamarcConfig::default(), backend, SessionStore::in_memory());
        let tutor = Arc::new(tutor);
        // A full event channel must not stop the panel from opening.
        let (tx, _rx) = mpsc::channel(1);
        tx.try_send(super::AppEvent::Tick).expect("fill channel");
        let client = TutorClient::new(tutor.clone(), tx);

        let conversation_id = tutor.open_conversation(None).expect("conversation");
        let mut app = App::new(find_persona("samie").expect("samie"), "http://localhost");
        app.conversation_id = active.then_some(conversation_id);
        tutor.send(conversation_id, "graph y = 2x").expect("send");
        let completion = completions.recv().await.expect("completion");
        apply_turn(completion, &client, &mut app);
        app
    }

    #[tokio::test]
    async fn graph_reply_opens_panel_even_with_full_channel() {
        let app = graph_turn(true).await;
        assert!(app.graph_open);
        assert_eq!(
            app.graph.as_ref().map(|graph| graph.title.as_str()),
            Some("y = 2x")
        );
        assert_eq!(app.status, "idle");
    }

    #[tokio::test]
    async fn background_conversation_does_not_open_panel() {
        let app = graph_turn(false).await;
        assert!(!app.graph_open);
        assert!(app.graph.is_none());
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("what is a derivative?"), Ok(None));
        assert_eq!(parse_slash_command("/"), Ok(None));
    }

    #[test]
    fn login_needs_both_credentials() {
        assert_eq!(
            parse_slash_command("/login ada secret"),
            Ok(Some(SlashCommand::Login {
                username: "ada".to_string(),
                password: "secret".to_string(),
            }))
        );
        assert_eq!(
            parse_slash_command("/login ada"),
            Err("usage: /login <username> <password>".to_string())
        );
    }

    #[test]
    fn register_grade_keeps_spaces() {
        assert_eq!(
            parse_slash_command("/register ada secret Grade 10"),
            Ok(Some(SlashCommand::Register {
                username: "ada".to_string(),
                password: "secret".to_string(),
                grade: Some("Grade 10".to_string()),
            }))
        );
        assert_eq!(
            parse_slash_command("/register ada secret"),
            Ok(Some(SlashCommand::Register {
                username: "ada".to_string(),
                password: "secret".to_string(),
                grade: None,
            }))
        );
    }

    #[test]
    fn journal_and_attack_keep_free_text() {
        assert_eq!(
            parse_slash_command("/journal  learned  limits today "),
            Ok(Some(SlashCommand::Journal("learned  limits today".to_string())))
        );
        assert_eq!(
            parse_slash_command("/attack 7 x = 2"),
            Ok(Some(SlashCommand::Attack {
                monster_id: 7,
                answer: "x = 2".to_string(),
            }))
        );
        assert_eq!(
            parse_slash_command("/attack seven 2"),
            Err("invalid monster id".to_string())
        );
    }

    #[test]
    fn mentor_without_args_shows_board() {
        assert_eq!(
            parse_slash_command("/mentor"),
            Ok(Some(SlashCommand::MentorBoard))
        );
        assert_eq!(
            parse_slash_command("/mentor MT-01 great work"),
            Ok(Some(SlashCommand::Mentor {
                mentor_id: "MT-01".to_string(),
                message: "great work".to_string(),
            }))
        );
        assert_eq!(
            parse_slash_command("/mentor MT-01"),
            Err("usage: /mentor <mentor_id> <message>".to_string())
        );
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(
            parse_slash_command("/Persona JUDY"),
            Ok(Some(SlashCommand::Persona("judy".to_string())))
        );
        assert_eq!(
            parse_slash_command("/dance"),
            Err("unknown command: dance".to_string())
        );
    }
}
