//! Request and response bodies exchanged with the DreamARC HTTP backend.

use crate::{DirectiveEnvelope, Role, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{role, content}` pair used in tutor request history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/learning/tutor-request`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorRequest {
    /// Persona system prompt followed by the conversation so far.
    pub history: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    pub persona: String,
    /// Latest student message, repeated outside the history.
    pub message: String,
    pub language: String,
}

/// Reply to a tutor request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorReply {
    #[serde(default = "default_reply_role")]
    pub role: Role,
    /// Raw content; may itself be a JSON-encoded `{"content": ...}` object.
    #[serde(default)]
    pub content: String,
    /// Optional typed directives sent next to the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directives: Option<DirectiveEnvelope>,
}

fn default_reply_role() -> Role {
    Role::Assistant
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub grade: String,
}

impl RegisterRequest {
    /// Grade sent when the student leaves it blank.
    pub const DEFAULT_GRADE: &'static str = "Not Specified";

    pub fn new(username: impl Into<String>, password: impl Into<String>, grade: Option<String>) -> Self {
        let grade = grade
            .filter(|grade| !grade.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_GRADE.to_string());
        Self {
            username: username.into(),
            password: password.into(),
            grade,
        }
    }
}

/// Raw login/register response. Field presence varies between endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub id: Option<StudentId>,
    #[serde(default)]
    pub student_id: Option<StudentId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl AuthResponse {
    /// Normalise into a session, filling gaps from `username`.
    ///
    /// Returns `None` when the response carries no access token.
    pub fn into_session(self, username: &str) -> Option<AuthSession> {
        let access_token = self.access_token.filter(|token| !token.is_empty())?;
        Some(AuthSession {
            access_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            id: self.id.or(self.student_id),
            name: self.name.unwrap_or_else(|| username.to_string()),
            email: self.email.unwrap_or_else(|| username.to_string()),
            role: self.role,
        })
    }
}

/// Authenticated student session, as persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub id: Option<StudentId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body of `POST /api/tts/speak`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakRequest {
    pub text: String,
    pub persona: String,
}

/// One journal entry returned by `GET /api/diary/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiaryEntry {
    /// `YYYY-MM-DD`.
    pub entry_date: String,
    pub content: String,
}

/// Body of `POST /api/diary/save`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiarySaveRequest {
    pub student_id: StudentId,
    pub date: String,
    pub content: String,
}

/// Battle-game monster guarding a practice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Monster {
    pub id: i64,
    pub monster_name: String,
    #[serde(default)]
    pub monster_type: Option<String>,
    #[serde(default)]
    pub topic_name: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub hp_max: i64,
    #[serde(default)]
    pub hp_current: i64,
    #[serde(default)]
    pub xp_reward: i64,
}

impl Monster {
    pub fn is_boss(&self) -> bool {
        self.monster_type.as_deref() == Some("BOSS")
    }
}

/// Body of `POST /api/game/attack`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttackRequest {
    pub student_id: StudentId,
    pub monster_id: i64,
    pub answer: String,
}

/// Result of an attack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttackOutcome {
    pub status: String,
    #[serde(default)]
    pub xp_gained: i64,
    #[serde(default)]
    pub message: String,
}

impl AttackOutcome {
    pub fn defeated(&self) -> bool {
        self.status == "defeated"
    }
}

/// Session log shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorLog {
    pub date: String,
    pub tutor: String,
    pub content: String,
}

/// Response of `GET /api/students/{id}/dashboard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    /// Latest PQ category scores keyed by category name.
    #[serde(default)]
    pub pq_scores: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub recent_logs: Vec<TutorLog>,
}

/// Weekly retention sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RmsqPoint {
    pub label: String,
    pub lambda_val: f64,
    pub rmsq: f64,
}

/// Advice attached to the retention stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RmsqInsight {
    pub status: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub judy_advice: String,
    #[serde(default)]
    pub samie_advice: String,
}

/// Response of `GET /api/students/{id}/rmsq-stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RmsqStats {
    #[serde(default)]
    pub graph_data: Vec<RmsqPoint>,
    #[serde(default)]
    pub insight: Option<RmsqInsight>,
}

/// Body of `POST /api/students/{id}/gc-messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentorMessageRequest {
    pub sender_id: String,
    pub sender_name: String,
    pub message: String,
}

/// Message posted to a student's board by a mentor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentorMessage {
    pub sender_name: String,
    #[serde(rename = "message_content")]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Generic `{status}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReply {
    pub status: String,
}

/// One step of a PQ waterfall history.
///
/// The first entry is the starting level and every later entry is a change
/// applied on top of the running total. Unknown keys survive a round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterfallEntry {
    pub value: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WaterfallEntry {
    /// Level a metric starts from when it has no history yet.
    pub const DEFAULT_START: f64 = 50.0;

    pub fn new(value: f64) -> Self {
        Self {
            value,
            extra: serde_json::Map::new(),
        }
    }

    /// History used for a metric the backend has never stored.
    pub fn default_history() -> Vec<WaterfallEntry> {
        vec![WaterfallEntry::new(Self::DEFAULT_START)]
    }

    /// Running totals after each step of `history`.
    pub fn running_totals(history: &[WaterfallEntry]) -> Vec<f64> {
        history
            .iter()
            .scan(0.0, |total, entry| {
                *total += entry.value;
                Some(*total)
            })
            .collect()
    }
}

/// PQ habit metrics tracked as waterfalls.
pub const PQ_METRICS: [&str; 5] = ["Homework", "Note Taking", "Attitude", "Test Prep", "Review"];

/// Match a user-typed metric name (`test-prep`, `note taking`) to its
/// canonical spelling.
pub fn canonical_metric(name: &str) -> Option<&'static str> {
    let wanted = name.trim().replace(['-', '_'], " ");
    PQ_METRICS
        .into_iter()
        .find(|metric| metric.eq_ignore_ascii_case(&wanted))
}

/// Response of `GET /api/students/{id}/pq-waterfall`: history per metric.
pub type PqWaterfall = BTreeMap<String, Vec<WaterfallEntry>>;

/// Body of `POST /api/students/{id}/pq-waterfall/update`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterfallUpdate {
    pub metric_name: String,
    pub new_entry: WaterfallEntry,
    /// Complete history including `new_entry`; the backend stores it as-is.
    pub full_history: Vec<WaterfallEntry>,
}

/// Latest AtoZ self-assessment (`GET /api/students/{id}/atoz`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtozLog {
    #[serde(default = "default_current_score")]
    pub current_score: i64,
    #[serde(default = "default_future_score")]
    pub future_score: i64,
    #[serde(default)]
    pub rms_plan: String,
    #[serde(default)]
    pub future_goal: String,
    /// Absent until the student has saved once.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Default for AtozLog {
    fn default() -> Self {
        Self {
            current_score: default_current_score(),
            future_score: default_future_score(),
            rms_plan: String::new(),
            future_goal: String::new(),
            updated_at: None,
        }
    }
}

fn default_current_score() -> i64 {
    50
}

fn default_future_score() -> i64 {
    80
}

/// Body of `POST /api/students/{id}/atoz`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtozUpdate {
    pub current_score: i64,
    pub future_score: i64,
    pub rms_plan: String,
    pub future_goal: String,
}

impl AtozUpdate {
    /// Scores are percentages.
    pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

    /// Build an update with both scores clamped into [`Self::SCORE_RANGE`].
    pub fn clamped(
        current_score: i64,
        future_score: i64,
        rms_plan: impl Into<String>,
        future_goal: impl Into<String>,
    ) -> Self {
        let (low, high) = (*Self::SCORE_RANGE.start(), *Self::SCORE_RANGE.end());
        Self {
            current_score: current_score.clamp(low, high),
            future_score: future_score.clamp(low, high),
            rms_plan: rms_plan.into(),
            future_goal: future_goal.into(),
        }
    }
}

/// Body of `POST /api/learning/judy-help`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudyHelpRequest {
    pub student_id: StudentId,
    pub monster_id: i64,
    pub student_answer: String,
}

/// Hint returned for a monster question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudyHint {
    #[serde(default)]
    pub hint: String,
}

/// Body of `POST /api/lambda/attempt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LambdaAttemptRequest {
    pub student_id: StudentId,
    pub topic_name: String,
    /// 1 for a correct answer, 0 otherwise.
    pub correctness: i64,
    /// Answer latency in seconds.
    pub latency_tau: f64,
    #[serde(default)]
    pub dependency_h: i64,
}

/// Forgetting rate of a topic before and after an attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LambdaAttemptOutcome {
    pub old_lambda: f64,
    pub new_lambda: f64,
}

impl LambdaAttemptOutcome {
    /// A falling lambda means the topic is being retained better.
    pub fn improved(&self) -> bool {
        self.new_lambda < self.old_lambda
    }
}
