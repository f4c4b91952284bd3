//! Backend abstraction for the DreamARC HTTP API.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use dreamarc_protocol::{
    AtozLog, AtozUpdate, AttackOutcome, AttackRequest, AuthResponse, Dashboard, DiaryEntry,
    DiarySaveRequest, JudyHelpRequest, JudyHint, LambdaAttemptOutcome, LambdaAttemptRequest,
    LoginRequest, MentorMessage, MentorMessageRequest, Monster, PqWaterfall, RegisterRequest,
    RmsqStats, SpeakRequest, StatusReply, StudentId, TutorReply, TutorRequest, WaterfallUpdate,
};
use thiserror::Error;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
    /// Login or register succeeded without handing out a token.
    #[error("login failed: missing access token from server")]
    MissingToken,
    /// Mentor board posts need a mentor id (`mt...`).
    #[error("access denied: {0:?} is not a mentor id")]
    InvalidMentorId(String),
    /// The backend implementation does not offer this call.
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

impl BackendError {
    /// True for failures reaching the backend at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Reject sender ids that are not mentor ids.
///
/// The prefix check is case-insensitive but whitespace-sensitive, matching
/// what the backend enforces.
pub fn ensure_mentor_id(sender_id: &str) -> Result<(), BackendError> {
    if sender_id.to_ascii_lowercase().starts_with("mt") {
        Ok(())
    } else {
        Err(BackendError::InvalidMentorId(sender_id.to_string()))
    }
}

/// Remote tutoring service.
///
/// Only authentication and tutor turns are required; every other call
/// defaults to `BackendError::Unsupported`.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError>;

    /// Ask the tutor for the next reply.
    async fn tutor_request(&self, request: &TutorRequest) -> Result<TutorReply, BackendError>;

    /// Synthesize speech; returns MPEG audio bytes (possibly empty).
    async fn speak(&self, _request: &SpeakRequest) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Unsupported("speech"))
    }

    async fn diary(&self, _student_id: StudentId) -> Result<Vec<DiaryEntry>, BackendError> {
        Err(BackendError::Unsupported("diary"))
    }

    async fn save_diary(&self, _request: &DiarySaveRequest) -> Result<StatusReply, BackendError> {
        Err(BackendError::Unsupported("diary"))
    }

    async fn monsters(&self, _student_id: StudentId) -> Result<Vec<Monster>, BackendError> {
        Err(BackendError::Unsupported("game"))
    }

    async fn attack(&self, _request: &AttackRequest) -> Result<AttackOutcome, BackendError> {
        Err(BackendError::Unsupported("game"))
    }

    async fn dashboard(&self, _student_id: StudentId) -> Result<Dashboard, BackendError> {
        Err(BackendError::Unsupported("dashboard"))
    }

    async fn rmsq_stats(&self, _student_id: StudentId) -> Result<RmsqStats, BackendError> {
        Err(BackendError::Unsupported("stats"))
    }

    async fn mentor_messages(
        &self,
        _student_id: StudentId,
    ) -> Result<Vec<MentorMessage>, BackendError> {
        Err(BackendError::Unsupported("mentor board"))
    }

    async fn post_mentor_message(
        &self,
        _student_id: StudentId,
        _request: &MentorMessageRequest,
    ) -> Result<StatusReply, BackendError> {
        Err(BackendError::Unsupported("mentor board"))
    }

    /// Waterfall history per PQ metric.
    async fn pq_waterfall(&self, _student_id: StudentId) -> Result<PqWaterfall, BackendError> {
        Err(BackendError::Unsupported("pq waterfall"))
    }

    /// Replace one metric's stored history.
    async fn update_pq_waterfall(
        &self,
        _student_id: StudentId,
        _update: &WaterfallUpdate,
    ) -> Result<StatusReply, BackendError> {
        Err(BackendError::Unsupported("pq waterfall"))
    }

    async fn atoz(&self, _student_id: StudentId) -> Result<AtozLog, BackendError> {
        Err(BackendError::Unsupported("atoz"))
    }

    async fn save_atoz(
        &self,
        _student_id: StudentId,
        _update: &AtozUpdate,
    ) -> Result<StatusReply, BackendError> {
        Err(BackendError::Unsupported("atoz"))
    }

    /// Ask Judy for a hint on a monster question.
    async fn judy_help(&self, _request: &JudyHelpRequest) -> Result<JudyHint, BackendError> {
        Err(BackendError::Unsupported("hints"))
    }

    /// Report a practice attempt and get the topic's updated forgetting rate.
    async fn lambda_attempt(
        &self,
        _request: &LambdaAttemptRequest,
    ) -> Result<LambdaAttemptOutcome, BackendError> {
        Err(BackendError::Unsupported("practice tracking"))
    }
}
