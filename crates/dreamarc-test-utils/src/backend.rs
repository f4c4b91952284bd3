use async_trait::async_trait;
use dreamarc_core::{BackendError, TutorBackend};
use dreamarc_protocol::{
    AtozLog, AtozUpdate, AttackOutcome, AttackRequest, AuthResponse, DiaryEntry,
    DiarySaveRequest, JudyHelpRequest, JudyHint, LambdaAttemptOutcome, LambdaAttemptRequest,
    LoginRequest, Monster, PqWaterfall, RegisterRequest, SpeakRequest, StatusReply, StudentId,
    TutorReply, TutorRequest, WaterfallUpdate,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

struct ScriptedTurn {
    delay: Option<Duration>,
    result: Result<TutorReply, BackendError>,
}

/// Backend that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    auth: Mutex<Option<AuthResponse>>,
    audio: Mutex<Vec<u8>>,
    diary: Mutex<Vec<DiaryEntry>>,
    monsters: Mutex<Vec<Monster>>,
    tutor_requests: Mutex<Vec<TutorRequest>>,
    logins: Mutex<Vec<LoginRequest>>,
    registrations: Mutex<Vec<RegisterRequest>>,
    speak_requests: Mutex<Vec<SpeakRequest>>,
    saved_diary: Mutex<Vec<DiarySaveRequest>>,
    attacks: Mutex<Vec<AttackRequest>>,
    waterfall: Mutex<PqWaterfall>,
    waterfall_updates: Mutex<Vec<WaterfallUpdate>>,
    atoz: Mutex<AtozLog>,
    atoz_updates: Mutex<Vec<AtozUpdate>>,
    hint: Mutex<String>,
    hint_requests: Mutex<Vec<JudyHelpRequest>>,
    attempts: Mutex<Vec<LambdaAttemptRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next tutor request.
    pub fn push_reply(&self, reply: TutorReply) -> &Self {
        self.push(None, Ok(reply))
    }

    /// Queue a reply that resolves only after `delay`.
    pub fn push_delayed_reply(&self, reply: TutorReply, delay: Duration) -> &Self {
        self.push(Some(delay), Ok(reply))
    }

    pub fn push_error(&self, error: BackendError) -> &Self {
        self.push(None, Err(error))
    }

    fn push(&self, delay: Option<Duration>, result: Result<TutorReply, BackendError>) -> &Self {
        self.turns.lock().push_back(ScriptedTurn { delay, result });
        self
    }

    /// Response handed out by login and register.
    pub fn with_auth(self, response: AuthResponse) -> Self {
        *self.auth.lock() = Some(response);
        self
    }

    pub fn with_audio(self, audio: Vec<u8>) -> Self {
        *self.audio.lock() = audio;
        self
    }

    pub fn with_diary(self, entries: Vec<DiaryEntry>) -> Self {
        *self.diary.lock() = entries;
        self
    }

    pub fn with_monsters(self, monsters: Vec<Monster>) -> Self {
        *self.monsters.lock() = monsters;
        self
    }

    /// Stored waterfall; updates replace the metric's history.
    pub fn with_waterfall(self, waterfall: PqWaterfall) -> Self {
        *self.waterfall.lock() = waterfall;
        self
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        *self.hint.lock() = hint.into();
        self
    }

    pub fn tutor_requests(&self) -> Vec<TutorRequest> {
        self.tutor_requests.lock().clone()
    }

    pub fn logins(&self) -> Vec<LoginRequest> {
        self.logins.lock().clone()
    }

    pub fn registrations(&self) -> Vec<RegisterRequest> {
        self.registrations.lock().clone()
    }

    pub fn speak_requests(&self) -> Vec<SpeakRequest> {
        self.speak_requests.lock().clone()
    }

    pub fn saved_diary(&self) -> Vec<DiarySaveRequest> {
        self.saved_diary.lock().clone()
    }

    pub fn attacks(&self) -> Vec<AttackRequest> {
        self.attacks.lock().clone()
    }

    pub fn waterfall_updates(&self) -> Vec<WaterfallUpdate> {
        self.waterfall_updates.lock().clone()
    }

    pub fn atoz_updates(&self) -> Vec<AtozUpdate> {
        self.atoz_updates.lock().clone()
    }

    pub fn hint_requests(&self) -> Vec<JudyHelpRequest> {
        self.hint_requests.lock().clone()
    }

    pub fn attempts(&self) -> Vec<LambdaAttemptRequest> {
        self.attempts.lock().clone()
    }

    fn auth(&self) -> Result<AuthResponse, BackendError> {
        self.auth.lock().clone().ok_or(BackendError::Status {
            status: 401,
            detail: "Incorrect username or password".to_string(),
        })
    }
}

#[async_trait]
impl TutorBackend for ScriptedBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.logins.lock().push(request.clone());
        self.auth()
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        self.registrations.lock().push(request.clone());
        self.auth()
    }

    async fn tutor_request(&self, request: &TutorRequest) -> Result<TutorReply, BackendError> {
        self.tutor_requests.lock().push(request.clone());
        let turn = self.turns.lock().pop_front();
        let Some(turn) = turn else {
            return Err(BackendError::Transport("script exhausted".to_string()));
        };
        if let Some(delay) = turn.delay {
            tokio::time::sleep(delay).await;
        }
        turn.result
    }

    async fn speak(&self, request: &SpeakRequest) -> Result<Vec<u8>, BackendError> {
        self.speak_requests.lock().push(request.clone());
        Ok(self.audio.lock().clone())
    }

    async fn diary(&self, _student_id: StudentId) -> Result<Vec<DiaryEntry>, BackendError> {
        Ok(self.diary.lock().clone())
    }

    async fn save_diary(&self, request: &DiarySaveRequest) -> Result<StatusReply, BackendError> {
        self.saved_diary.lock().push(request.clone());
        Ok(StatusReply {
            status: "saved".to_string(),
        })
    }

    async fn monsters(&self, _student_id: StudentId) -> Result<Vec<Monster>, BackendError> {
        Ok(self.monsters.lock().clone())
    }

    async fn attack(&self, request: &AttackRequest) -> Result<AttackOutcome, BackendError> {
        self.attacks.lock().push(request.clone());
        let defeated = self
            .monsters
            .lock()
            .iter()
            .any(|monster| monster.id == request.monster_id);
        Ok(AttackOutcome {
            status: if defeated { "defeated" } else { "missed" }.to_string(),
            xp_gained: if defeated { 10 } else { 0 },
            message: String::new(),
        })
    }

    async fn pq_waterfall(&self, _student_id: StudentId) -> Result<PqWaterfall, BackendError> {
        Ok(self.waterfall.lock().clone())
    }

    async fn update_pq_waterfall(
        &self,
        _student_id: StudentId,
        update: &WaterfallUpdate,
    ) -> Result<StatusReply, BackendError> {
        self.waterfall_updates.lock().push(update.clone());
        self.waterfall
            .lock()
            .insert(update.metric_name.clone(), update.full_history.clone());
        Ok(StatusReply {
            status: "saved".to_string(),
        })
    }

    async fn atoz(&self, _student_id: StudentId) -> Result<AtozLog, BackendError> {
        Ok(self.atoz.lock().clone())
    }

    async fn save_atoz(
        &self,
        _student_id: StudentId,
        update: &AtozUpdate,
    ) -> Result<StatusReply, BackendError> {
        self.atoz_updates.lock().push(update.clone());
        *self.atoz.lock() = AtozLog {
            current_score: update.current_score,
            future_score: update.future_score,
            rms_plan: update.rms_plan.clone(),
            future_goal: update.future_goal.clone(),
            updated_at: None,
        };
        Ok(StatusReply {
            status: "saved".to_string(),
        })
    }

    async fn judy_help(&self, request: &JudyHelpRequest) -> Result<JudyHint, BackendError> {
        self.hint_requests.lock().push(request.clone());
        Ok(JudyHint {
            hint: self.hint.lock().clone(),
        })
    }

    async fn lambda_attempt(
        &self,
        request: &LambdaAttemptRequest,
    ) -> Result<LambdaAttemptOutcome, BackendError> {
        self.attempts.lock().push(request.clone());
        let new_lambda = if request.correctness == 1 { 0.8 } else { 2.5 };
        Ok(LambdaAttemptOutcome {
            old_lambda: 1.0,
            new_lambda,
        })
    }
}

/// Backend whose every call fails at the transport level.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingBackend;

fn unreachable_backend() -> BackendError {
    BackendError::Transport("connection refused".to_string())
}

#[async_trait]
impl TutorBackend for FailingBackend {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        Err(unreachable_backend())
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        Err(unreachable_backend())
    }

    async fn tutor_request(&self, _request: &TutorRequest) -> Result<TutorReply, BackendError> {
        Err(unreachable_backend())
    }
}
