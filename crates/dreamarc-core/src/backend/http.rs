//! reqwest-based client for the DreamARC HTTP API.

use super::{BackendError, TutorBackend, ensure_mentor_id};
use crate::session::SessionStore;
use async_trait::async_trait;
use dreamarc_config::BackendConfig;
use dreamarc_protocol::{
    AtozLog, AtozUpdate, AttackOutcome, AttackRequest, AuthResponse, Dashboard, DiaryEntry,
    DiarySaveRequest, JudyHelpRequest, JudyHint, LambdaAttemptOutcome, LambdaAttemptRequest,
    LoginRequest, MentorMessage, MentorMessageRequest, Monster, PqWaterfall, RegisterRequest,
    RmsqStats, SpeakRequest, StatusReply, StudentId, TutorReply, TutorRequest, WaterfallUpdate,
};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// HTTP implementation of `TutorBackend`.
///
/// Requests carry `Authorization: Bearer <token>` whenever the shared
/// session store holds a session.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl HttpBackend {
    /// Build a client from backend config.
    pub fn new(config: &BackendConfig, session: SessionStore) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.base_url, session))
    }

    /// Use an existing reqwest client.
    pub fn with_client(client: Client, base_url: &str, session: SessionStore) -> Self {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        debug!("http backend ready (base_url={})", base_url);
        Self {
            client,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_default();
        warn!(
            "backend request failed (status={}, detail={})",
            status.as_u16(),
            detail
        );
        Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(builder).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Extract a human-readable message from an error body.
///
/// Prefers the `detail` field of a JSON body; otherwise the raw text.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(body.to_string()),
        },
        Err(_) => Some(body.to_string()),
    }
}

#[async_trait]
impl TutorBackend for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        debug!("login request (username={})", request.username);
        self.send_json(self.client.post(self.url("/api/auth/login")).json(request))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        debug!(
            "register request (username={}, grade={})",
            request.username, request.grade
        );
        self.send_json(self.client.post(self.url("/api/auth/register")).json(request))
            .await
    }

    async fn tutor_request(&self, request: &TutorRequest) -> Result<TutorReply, BackendError> {
        debug!(
            "tutor request (persona={}, history_len={})",
            request.persona,
            request.history.len()
        );
        self.send_json(self.post("/api/learning/tutor-request").json(request))
            .await
    }

    async fn speak(&self, request: &SpeakRequest) -> Result<Vec<u8>, BackendError> {
        let response = self.send(self.post("/api/tts/speak").json(request)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn diary(&self, student_id: StudentId) -> Result<Vec<DiaryEntry>, BackendError> {
        self.send_json(self.get(&format!("/api/diary/{student_id}")))
            .await
    }

    async fn save_diary(&self, request: &DiarySaveRequest) -> Result<StatusReply, BackendError> {
        self.send_json(self.post("/api/diary/save").json(request))
            .await
    }

    async fn monsters(&self, student_id: StudentId) -> Result<Vec<Monster>, BackendError> {
        self.send_json(self.get(&format!("/api/game/{student_id}/monsters")))
            .await
    }

    async fn attack(&self, request: &AttackRequest) -> Result<AttackOutcome, BackendError> {
        self.send_json(self.post("/api/game/attack").json(request))
            .await
    }

    async fn dashboard(&self, student_id: StudentId) -> Result<Dashboard, BackendError> {
        self.send_json(self.get(&format!("/api/students/{student_id}/dashboard")))
            .await
    }

    async fn rmsq_stats(&self, student_id: StudentId) -> Result<RmsqStats, BackendError> {
        self.send_json(self.get(&format!("/api/students/{student_id}/rmsq-stats")))
            .await
    }

    async fn mentor_messages(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<MentorMessage>, BackendError> {
        self.send_json(self.get(&format!("/api/students/{student_id}/gc-messages")))
            .await
    }

    async fn post_mentor_message(
        &self,
        student_id: StudentId,
        request: &MentorMessageRequest,
    ) -> Result<StatusReply, BackendError> {
        ensure_mentor_id(&request.sender_id)?;
        self.send_json(
            self.post(&format!("/api/students/{student_id}/gc-messages"))
                .json(request),
        )
        .await
    }

    async fn pq_waterfall(&self, student_id: StudentId) -> Result<PqWaterfall, BackendError> {
        self.send_json(self.get(&format!("/api/students/{student_id}/pq-waterfall")))
            .await
    }

    async fn update_pq_waterfall(
        &self,
        student_id: StudentId,
        update: &WaterfallUpdate,
    ) -> Result<StatusReply, BackendError> {
        debug!(
            "waterfall update (metric={}, history_len={})",
            update.metric_name,
            update.full_history.len()
        );
        self.send_json(
            self.post(&format!("/api/students/{student_id}/pq-waterfall/update"))
                .json(update),
        )
        .await
    }

    async fn atoz(&self, student_id: StudentId) -> Result<AtozLog, BackendError> {
        self.send_json(self.get(&format!("/api/students/{student_id}/atoz")))
            .await
    }

    async fn save_atoz(
        &self,
        student_id: StudentId,
        update: &AtozUpdate,
    ) -> Result<StatusReply, BackendError> {
        self.send_json(
            self.post(&format!("/api/students/{student_id}/atoz"))
                .json(update),
        )
        .await
    }

    async fn judy_help(&self, request: &JudyHelpRequest) -> Result<JudyHint, BackendError> {
        self.send_json(self.post("/api/learning/judy-help").json(request))
            .await
    }

    async fn lambda_attempt(
        &self,
        request: &LambdaAttemptRequest,
    ) -> Result<LambdaAttemptOutcome, BackendError> {
        debug!(
            "lambda attempt (topic={}, correctness={})",
            request.topic_name, request.correctness
        );
        self.send_json(self.post("/api/lambda/attempt").json(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trailing_slash_is_stripped() {
        let backend = HttpBackend::with_client(
            Client::new(),
            "https://example.test/ ",
            SessionStore::in_memory(),
        );
        assert_eq!(backend.base_url(), "https://example.test");
        assert_eq!(backend.url("/api/x"), "https://example.test/api/x");
    }

    #[test]
    fn error_detail_prefers_detail_field() {
        assert_eq!(
            error_detail(r#"{"detail": "Incorrect"}"#),
            Some("Incorrect".to_string())
        );
        assert_eq!(
            error_detail(r#"{"detail": [{"msg": "field required"}]}"#),
            Some(r#"[{"msg":"field required"}]"#.to_string())
        );
        assert_eq!(error_detail("Bad Gateway"), Some("Bad Gateway".to_string()));
        assert_eq!(error_detail("  "), None);
    }
}
