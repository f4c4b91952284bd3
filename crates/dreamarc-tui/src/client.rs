//! Background action runner for the TUI.

use crate::event::{ActionOutcome, AppEvent, AtozEdit};
use dreamarc_core::{DreamarcCoreError, Tutor};
use dreamarc_protocol::ConversationId;
use log::debug;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs tutor calls off the UI loop and reports back as `AppEvent`s.
#[derive(Clone)]
pub struct TutorClient {
    tutor: Arc<Tutor>,
    sender: mpsc::Sender<AppEvent>,
}

impl TutorClient {
    pub fn new(tutor: Arc<Tutor>, sender: mpsc::Sender<AppEvent>) -> Self {
        Self { tutor, sender }
    }

    pub fn tutor(&self) -> &Tutor {
        &self.tutor
    }

    fn spawn<F>(&self, action: &'static str, future: F)
    where
        F: Future<Output = Result<ActionOutcome, DreamarcCoreError>> + Send + 'static,
    {
        let sender = self.sender.clone();
        debug!("dispatching action (action={})", action);
        tokio::spawn(async move {
            let event = match future.await {
                Ok(outcome) => AppEvent::Action(outcome),
                Err(error) => AppEvent::ActionFailed { action, error },
            };
            let _ = sender.send(event).await;
        });
    }

    pub fn login(&self, username: String, password: String) {
        let tutor = self.tutor.clone();
        self.spawn("login", async move {
            tutor
                .login(&username, &password)
                .await
                .map(ActionOutcome::SignedIn)
        });
    }

    pub fn register(&self, username: String, password: String, grade: Option<String>) {
        let tutor = self.tutor.clone();
        self.spawn("register", async move {
            tutor
                .register(&username, &password, grade)
                .await
                .map(ActionOutcome::SignedIn)
        });
    }

    pub fn speak(&self, conversation_id: ConversationId) {
        let tutor = self.tutor.clone();
        self.spawn("speech", async move {
            tutor
                .speak(conversation_id)
                .await
                .map(ActionOutcome::SpeechWritten)
        });
    }

    pub fn diary(&self) {
        let tutor = self.tutor.clone();
        self.spawn("diary", async move { tutor.diary().await.map(ActionOutcome::Diary) });
    }

    pub fn save_diary(&self, content: String) {
        let tutor = self.tutor.clone();
        self.spawn("journal", async move {
            tutor
                .save_diary(&content)
                .await
                .map(ActionOutcome::DiarySaved)
        });
    }

    pub fn monsters(&self) {
        let tutor = self.tutor.clone();
        self.spawn("monsters", async move {
            tutor.monsters().await.map(ActionOutcome::Monsters)
        });
    }

    pub fn attack(&self, monster_id: i64, answer: String) {
        let tutor = self.tutor.clone();
        self.spawn("attack", async move {
            tutor
                .attack(monster_id, &answer)
                .await
                .map(ActionOutcome::Attack)
        });
    }

    pub fn stats(&self) {
        let tutor = self.tutor.clone();
        self.spawn("stats", async move {
            let dashboard = tutor.dashboard().await?;
            let rmsq = tutor.rmsq_stats().await?;
            Ok(ActionOutcome::Stats { dashboard, rmsq })
        });
    }

    pub fn mentor_board(&self) {
        let tutor = self.tutor.clone();
        self.spawn("mentor board", async move {
            tutor
                .mentor_messages()
                .await
                .map(ActionOutcome::MentorBoard)
        });
    }

    pub fn post_mentor_message(&self, mentor_id: String, message: String) {
        let tutor = self.tutor.clone();
        self.spawn("mentor board", async move {
            tutor
                .post_mentor_message(&mentor_id, &mentor_id, &message)
                .await
                .map(ActionOutcome::MentorPosted)
        });
    }

    pub fn waterfall(&self) {
        let tutor = self.tutor.clone();
        self.spawn("waterfall", async move {
            tutor.waterfall().await.map(ActionOutcome::Waterfall)
        });
    }

    pub fn add_waterfall_entry(&self, metric: String, change: f64) {
        let tutor = self.tutor.clone();
        self.spawn("waterfall", async move {
            tutor
                .add_waterfall_entry(&metric, change)
                .await
                .map(ActionOutcome::WaterfallSaved)
        });
    }

    pub fn atoz(&self) {
        let tutor = self.tutor.clone();
        self.spawn("atoz", async move { tutor.atoz().await.map(ActionOutcome::Atoz) });
    }

    /// Apply an edit on top of the stored AtoZ log and save the result.
    pub fn edit_atoz(&self, edit: AtozEdit) {
        let tutor = self.tutor.clone();
        self.spawn("atoz", async move {
            let mut log = tutor.atoz().await?;
            edit.apply(&mut log);
            tutor
                .save_atoz(
                    log.current_score,
                    log.future_score,
                    &log.rms_plan,
                    &log.future_goal,
                )
                .await?;
            Ok(ActionOutcome::AtozSaved(tutor.atoz().await?))
        });
    }

    pub fn hint(&self, monster_id: i64, answer: String) {
        let tutor = self.tutor.clone();
        self.spawn("hint", async move {
            tutor
                .judy_hint(monster_id, &answer)
                .await
                .map(|hint| ActionOutcome::Hint(hint.hint))
        });
    }

    pub fn record_attempt(&self, topic: String, correct: bool, latency_secs: f64) {
        let tutor = self.tutor.clone();
        self.spawn("practice", async move {
            let outcome = tutor.record_attempt(&topic, correct, latency_secs, 0).await?;
            Ok(ActionOutcome::Attempt { topic, outcome })
        });
    }
}
