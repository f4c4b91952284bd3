//! TUI event types for input, turn completions and background actions.

use crossterm::event::KeyEvent;
use dreamarc_core::{DreamarcCoreError, TurnCompletion};
use dreamarc_protocol::{
    AtozLog, AttackOutcome, AuthSession, Dashboard, DiaryEntry, LambdaAttemptOutcome,
    MentorMessage, Monster, PqWaterfall, RmsqStats, StatusReply,
};
use std::path::PathBuf;

/// Application event emitted by input handlers, the tutor or action tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event.
    Tick,
    /// Scroll event in the chat view.
    Scroll(i16),
    /// A tutor turn finished.
    Turn(TurnCompletion),
    /// A background action finished.
    Action(ActionOutcome),
    /// A background action failed.
    ActionFailed {
        action: &'static str,
        error: DreamarcCoreError,
    },
}

/// Successful result of a background action.
#[derive(Debug)]
pub enum ActionOutcome {
    SignedIn(AuthSession),
    SpeechWritten(PathBuf),
    Diary(Vec<DiaryEntry>),
    DiarySaved(StatusReply),
    Monsters(Vec<Monster>),
    Attack(AttackOutcome),
    Stats {
        dashboard: Dashboard,
        rmsq: RmsqStats,
    },
    MentorBoard(Vec<MentorMessage>),
    MentorPosted(StatusReply),
    Waterfall(PqWaterfall),
    /// Waterfall after a new entry was stored.
    WaterfallSaved(PqWaterfall),
    Atoz(AtozLog),
    AtozSaved(AtozLog),
    Hint(String),
    Attempt {
        topic: String,
        outcome: LambdaAttemptOutcome,
    },
}

/// Change requested by `/atoz`; untouched fields keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum AtozEdit {
    Scores {
        current_score: i64,
        future_score: i64,
        future_goal: String,
    },
    Plan(String),
}

impl AtozEdit {
    pub fn apply(self, log: &mut AtozLog) {
        match self {
            AtozEdit::Scores {
                current_score,
                future_score,
                future_goal,
            } => {
                log.current_score = current_score;
                log.future_score = future_score;
                log.future_goal = future_goal;
            }
            AtozEdit::Plan(plan) => log.rms_plan = plan,
        }
    }
}
