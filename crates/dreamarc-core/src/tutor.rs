//! Tutor facade: sessions, conversations, turns and backend passthroughs.

use crate::backend::{BackendError, HttpBackend, TutorBackend};
use crate::conversation::Conversation;
use crate::directive::DirectiveSink;
use crate::dispatcher::{DispatchError, TurnCompletion, TurnDispatcher};
use crate::error::DreamarcCoreError;
use crate::persona::{Persona, find_persona};
use crate::session::{JsonFileSessionPersistence, SessionPersistence, SessionStore};
use crate::speech::sanitize_for_speech;
use chrono::Local;
use dreamarc_config::DreamarcConfig;
use dreamarc_protocol::{
    AtozLog, AtozUpdate, AttackOutcome, AttackRequest, AuthResponse, AuthSession, ChatMessage,
    ConversationId, Dashboard, DiaryEntry, DiarySaveRequest, JudyHelpRequest, JudyHint,
    LambdaAttemptOutcome, LambdaAttemptRequest, LoginRequest, MentorMessage,
    MentorMessageRequest, Monster, PqWaterfall, RegisterRequest, RmsqStats, SpeakRequest,
    StatusReply, StudentId, TurnId, WaterfallEntry, WaterfallUpdate, canonical_metric,
};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const COMPLETION_BUFFER: usize = 64;

/// Entry point for the tutoring client.
///
/// Owns the session store, every open conversation and the turn
/// dispatcher. Turn results arrive on the receiver returned by the
/// constructor and are applied with [`Tutor::apply_completion`].
pub struct Tutor {
    config: Arc<DreamarcConfig>,
    backend: Arc<dyn TutorBackend>,
    session: SessionStore,
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    dispatcher: TurnDispatcher,
}

impl Tutor {
    /// Wire a tutor around an existing backend and session store.
    pub fn new(
        config: DreamarcConfig,
        backend: Arc<dyn TutorBackend>,
        session: SessionStore,
    ) -> (Self, mpsc::Receiver<TurnCompletion>) {
        let (dispatcher, completions) = TurnDispatcher::new(COMPLETION_BUFFER);
        info!("initializing tutor (persona={})", config.tutor.default_persona);
        (
            Self {
                config: Arc::new(config),
                backend,
                session,
                conversations: RwLock::new(HashMap::new()),
                dispatcher,
            },
            completions,
        )
    }

    /// Build the default stack: file-backed session and HTTP backend.
    ///
    /// The persisted session is hydrated before the tutor is returned.
    pub fn from_config(
        config: DreamarcConfig,
    ) -> Result<(Self, mpsc::Receiver<TurnCompletion>), DreamarcCoreError> {
        let persistence: Option<Arc<dyn SessionPersistence>> = if config.session.enabled {
            config.session.resolved_path().map(|path| {
                debug!("session persistence enabled (path={})", path.display());
                Arc::new(JsonFileSessionPersistence::new(path)) as Arc<dyn SessionPersistence>
            })
        } else {
            None
        };
        let session = SessionStore::new(persistence);
        session.hydrate();
        let backend = HttpBackend::new(&config.backend, session.clone())?;
        Ok(Self::new(config, Arc::new(backend), session))
    }

    pub fn config(&self) -> &DreamarcConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn current_session(&self) -> Option<AuthSession> {
        self.session.current()
    }

    /// Sign in and persist the session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, DreamarcCoreError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.backend.login(&request).await?;
        self.adopt_session(response, username)
    }

    /// Create an account and sign in with it.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        grade: Option<String>,
    ) -> Result<AuthSession, DreamarcCoreError> {
        let request = RegisterRequest::new(username, password, grade);
        let response = self.backend.register(&request).await?;
        self.adopt_session(response, username)
    }

    fn adopt_session(
        &self,
        response: AuthResponse,
        username: &str,
    ) -> Result<AuthSession, DreamarcCoreError> {
        let session = response
            .into_session(username)
            .ok_or(BackendError::MissingToken)?;
        self.session.set(session.clone())?;
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), DreamarcCoreError> {
        self.session.clear()?;
        Ok(())
    }

    /// Open a new conversation with a persona; `None` uses the configured default.
    pub fn open_conversation(
        &self,
        persona_id: Option<&str>,
    ) -> Result<ConversationId, DreamarcCoreError> {
        let persona_id = persona_id.unwrap_or(&self.config.tutor.default_persona);
        let persona = find_persona(persona_id)
            .ok_or_else(|| DreamarcCoreError::UnknownPersona(persona_id.to_string()))?;
        let conversation = Conversation::new(persona, self.config.tutor.language.clone());
        let id = conversation.id();
        self.conversations.write().insert(id, conversation);
        Ok(id)
    }

    /// Drop a conversation and abort its in-flight turn.
    pub fn close_conversation(&self, conversation_id: ConversationId) -> bool {
        self.dispatcher.cancel(conversation_id);
        self.conversations.write().remove(&conversation_id).is_some()
    }

    /// Snapshot of a conversation.
    pub fn conversation(&self, conversation_id: ConversationId) -> Option<Conversation> {
        self.conversations.read().get(&conversation_id).cloned()
    }

    pub fn persona_of(
        &self,
        conversation_id: ConversationId,
    ) -> Result<&'static Persona, DreamarcCoreError> {
        self.conversations
            .read()
            .get(&conversation_id)
            .map(Conversation::persona)
            .ok_or(DreamarcCoreError::UnknownConversation(conversation_id))
    }

    /// Send a student message. The reply arrives as a `TurnCompletion`.
    ///
    /// A turn still pending for the same conversation is cancelled.
    pub fn send(
        &self,
        conversation_id: ConversationId,
        text: &str,
    ) -> Result<TurnId, DreamarcCoreError> {
        let request = {
            let mut conversations = self.conversations.write();
            let conversation = conversations
                .get_mut(&conversation_id)
                .ok_or(DreamarcCoreError::UnknownConversation(conversation_id))?;
            conversation.begin_turn(text, self.session.student_id())
        };
        let backend = self.backend.clone();
        let turn_id = self
            .dispatcher
            .submit(conversation_id, async move { backend.tutor_request(&request).await });
        Ok(turn_id)
    }

    pub fn cancel(&self, conversation_id: ConversationId) -> bool {
        self.dispatcher.cancel(conversation_id)
    }

    pub fn is_in_flight(&self, conversation_id: ConversationId) -> bool {
        self.dispatcher.is_in_flight(conversation_id)
    }

    /// Fold a finished turn into its conversation.
    ///
    /// Returns the appended assistant message, or `None` when the
    /// completion was stale and has been discarded. Backend failures become
    /// the fallback reply.
    pub fn apply_completion(
        &self,
        completion: TurnCompletion,
        sink: &dyn DirectiveSink,
    ) -> Result<Option<ChatMessage>, DreamarcCoreError> {
        let TurnCompletion {
            conversation_id,
            turn_id,
            result,
        } = completion;
        match self.dispatcher.finish(conversation_id, turn_id) {
            Ok(()) => {}
            Err(DispatchError::Stale { .. }) => return Ok(None),
        }

        let mut conversations = self.conversations.write();
        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or(DreamarcCoreError::UnknownConversation(conversation_id))?;
        let message = match result {
            Ok(reply) => conversation.complete_turn(reply, sink).clone(),
            Err(err) => {
                warn!(
                    "tutor turn failed (conversation_id={}, turn_id={}): {}",
                    conversation_id, turn_id, err
                );
                conversation.fail_turn().clone()
            }
        };
        Ok(Some(message))
    }

    /// Speak the latest assistant message of a conversation.
    ///
    /// The text is sanitised first and the audio written to the configured
    /// output path.
    pub async fn speak(
        &self,
        conversation_id: ConversationId,
    ) -> Result<PathBuf, DreamarcCoreError> {
        let output = self
            .config
            .speech
            .output_path
            .as_ref()
            .map(PathBuf::from)
            .ok_or_else(|| {
                DreamarcCoreError::SpeechUnavailable("no speech output path configured".into())
            })?;
        let (text, persona) = {
            let conversations = self.conversations.read();
            let conversation = conversations
                .get(&conversation_id)
                .ok_or(DreamarcCoreError::UnknownConversation(conversation_id))?;
            (
                conversation.last_assistant_text().unwrap_or_default().to_string(),
                conversation.persona().id,
            )
        };
        let text = sanitize_for_speech(&text);
        if text.is_empty() {
            return Err(DreamarcCoreError::SpeechUnavailable(
                "nothing to read aloud".into(),
            ));
        }

        let audio = self
            .backend
            .speak(&SpeakRequest {
                text,
                persona: persona.to_string(),
            })
            .await?;
        if audio.is_empty() {
            return Err(DreamarcCoreError::SpeechUnavailable(
                "backend returned no audio".into(),
            ));
        }
        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&output, &audio).await?;
        info!(
            "speech written (path={}, bytes={})",
            output.display(),
            audio.len()
        );
        Ok(output)
    }

    fn require_student(&self) -> Result<StudentId, DreamarcCoreError> {
        let session = self.session.current().ok_or(DreamarcCoreError::NotSignedIn)?;
        session.id.ok_or(DreamarcCoreError::MissingStudentId)
    }

    pub async fn diary(&self) -> Result<Vec<DiaryEntry>, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.diary(student_id).await?)
    }

    /// Save today's journal entry.
    pub async fn save_diary(&self, content: &str) -> Result<StatusReply, DreamarcCoreError> {
        let student_id = self.require_student()?;
        let request = DiarySaveRequest {
            student_id,
            date: Local::now().format("%Y-%m-%d").to_string(),
            content: content.to_string(),
        };
        Ok(self.backend.save_diary(&request).await?)
    }

    pub async fn monsters(&self) -> Result<Vec<Monster>, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.monsters(student_id).await?)
    }

    pub async fn attack(
        &self,
        monster_id: i64,
        answer: &str,
    ) -> Result<AttackOutcome, DreamarcCoreError> {
        let student_id = self.require_student()?;
        let request = AttackRequest {
            student_id,
            monster_id,
            answer: answer.to_string(),
        };
        Ok(self.backend.attack(&request).await?)
    }

    pub async fn dashboard(&self) -> Result<Dashboard, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.dashboard(student_id).await?)
    }

    pub async fn rmsq_stats(&self) -> Result<RmsqStats, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.rmsq_stats(student_id).await?)
    }

    pub async fn mentor_messages(&self) -> Result<Vec<MentorMessage>, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.mentor_messages(student_id).await?)
    }

    /// Post to the signed-in student's mentor board.
    pub async fn post_mentor_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        message: &str,
    ) -> Result<StatusReply, DreamarcCoreError> {
        let student_id = self.require_student()?;
        let request = MentorMessageRequest {
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            message: message.to_string(),
        };
        Ok(self.backend.post_mentor_message(student_id, &request).await?)
    }

    pub async fn waterfall(&self) -> Result<PqWaterfall, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.pq_waterfall(student_id).await?)
    }

    /// Append a change to one PQ metric and store its full history.
    ///
    /// A metric without stored history starts from
    /// [`WaterfallEntry::DEFAULT_START`]. Returns the refreshed waterfall.
    pub async fn add_waterfall_entry(
        &self,
        metric: &str,
        change: f64,
    ) -> Result<PqWaterfall, DreamarcCoreError> {
        let metric_name = canonical_metric(metric)
            .ok_or_else(|| DreamarcCoreError::UnknownMetric(metric.to_string()))?;
        let student_id = self.require_student()?;
        let mut waterfall = self.backend.pq_waterfall(student_id).await?;
        let mut history = waterfall
            .remove(metric_name)
            .filter(|history| !history.is_empty())
            .unwrap_or_else(WaterfallEntry::default_history);
        let new_entry = WaterfallEntry::new(change);
        history.push(new_entry.clone());

        let update = WaterfallUpdate {
            metric_name: metric_name.to_string(),
            new_entry,
            full_history: history.clone(),
        };
        self.backend.update_pq_waterfall(student_id, &update).await?;
        info!(
            "waterfall updated (metric={}, steps={})",
            metric_name,
            history.len()
        );
        waterfall.insert(metric_name.to_string(), history);
        Ok(waterfall)
    }

    pub async fn atoz(&self) -> Result<AtozLog, DreamarcCoreError> {
        let student_id = self.require_student()?;
        Ok(self.backend.atoz(student_id).await?)
    }

    /// Save an AtoZ self-assessment; scores are clamped to 0..=100.
    pub async fn save_atoz(
        &self,
        current_score: i64,
        future_score: i64,
        rms_plan: &str,
        future_goal: &str,
    ) -> Result<StatusReply, DreamarcCoreError> {
        let student_id = self.require_student()?;
        let update = AtozUpdate::clamped(current_score, future_score, rms_plan, future_goal);
        Ok(self.backend.save_atoz(student_id, &update).await?)
    }

    /// Ask Judy for a hint on a monster question without attacking.
    pub async fn judy_hint(
        &self,
        monster_id: i64,
        answer: &str,
    ) -> Result<JudyHint, DreamarcCoreError> {
        let student_id = self.require_student()?;
        let request = JudyHelpRequest {
            student_id,
            monster_id,
            student_answer: answer.to_string(),
        };
        Ok(self.backend.judy_help(&request).await?)
    }

    /// Report one practice attempt on a topic.
    pub async fn record_attempt(
        &self,
        topic: &str,
        correct: bool,
        latency_secs: f64,
        dependency_h: i64,
    ) -> Result<LambdaAttemptOutcome, DreamarcCoreError> {
        let student_id = self.require_student()?;
        let request = LambdaAttemptRequest {
            student_id,
            topic_name: topic.to_string(),
            correctness: i64::from(correct),
            latency_tau: latency_secs,
            dependency_h,
        };
        Ok(self.backend.lambda_attempt(&request).await?)
    }
}

impl Drop for Tutor {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
    }
}
