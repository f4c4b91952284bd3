//! HttpBackend integration tests against an in-process axum server.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use dreamarc_core::{BackendError, HttpBackend, SessionStore, TutorBackend};
use dreamarc_protocol::{
    AtozUpdate, AttackRequest, AuthSession, DiarySaveRequest, JudyHelpRequest,
    LambdaAttemptRequest, LoginRequest, MentorMessageRequest, RegisterRequest, Role,
    SpeakRequest, TutorRequest, WaterfallEntry, WaterfallUpdate, WireMessage,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockState {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    fn last(&self) -> Recorded {
        self.requests.lock().last().cloned().expect("a recorded request")
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        authorization,
        body: body.clone(),
    });

    let ok = |value: Value| (StatusCode::OK, axum::Json(value)).into_response();
    match (method.as_str(), uri.path()) {
        ("POST", "/api/auth/login") if body["username"] == "ada" => ok(json!({
            "access_token": "tok-ada",
            "token_type": "bearer",
            "id": 7,
            "name": "Ada",
            "email": "ada@example.test",
            "role": "student"
        })),
        ("POST", "/api/auth/login") => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response(),
        ("POST", "/api/auth/register") => ok(json!({
            "access_token": "tok-new",
            "student_id": 8
        })),
        ("POST", "/api/learning/tutor-request") if body["message"] == "boom" => {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        ("POST", "/api/learning/tutor-request") => ok(json!({
            "role": "assistant",
            "content": "Let's graph it."
        })),
        ("POST", "/api/tts/speak") => (StatusCode::OK, b"ID3audio".to_vec()).into_response(),
        ("GET", "/api/diary/7") => ok(json!([
            {"entry_date": "2026-10-01", "content": "Fractions were fine."}
        ])),
        ("POST", "/api/diary/save") => ok(json!({"status": "saved"})),
        ("GET", "/api/game/7/monsters") => ok(json!([{
            "id": 3,
            "monster_name": "Slope Slime",
            "monster_type": "BOSS",
            "topic_name": "Linear functions",
            "question_text": "Slope of y = 2x + 1?",
            "hp_max": 100,
            "hp_current": 40,
            "xp_reward": 50
        }])),
        ("POST", "/api/game/attack") => ok(json!({
            "status": "defeated",
            "xp_gained": 50,
            "message": "Critical hit!"
        })),
        ("GET", "/api/students/7/dashboard") => ok(json!({
            "pq_scores": {"Focus": 72},
            "recent_logs": [{"date": "2026-10-02", "tutor": "samie", "content": "Slopes"}]
        })),
        ("GET", "/api/students/7/rmsq-stats") => ok(json!({
            "graph_data": [{"label": "W1", "lambda_val": 0.4, "rmsq": 0.82}],
            "insight": {"status": "Stable", "color": "green", "judy_advice": "Keep going", "samie_advice": "Review"}
        })),
        ("GET", "/api/students/7/gc-messages") => ok(json!([
            {"sender_name": "Mr. Lee", "message_content": "Great week!", "created_at": "2026-10-03"}
        ])),
        ("POST", "/api/students/7/gc-messages") => ok(json!({"status": "sent"})),
        ("GET", "/api/students/7/pq-waterfall") => ok(json!({
            "Homework": [{"value": 50}, {"value": 5}],
            "Review": [{"value": 40}]
        })),
        ("POST", "/api/students/7/pq-waterfall/update") => ok(json!({"status": "saved"})),
        ("GET", "/api/students/7/atoz") => ok(json!({
            "id": 4,
            "student_id": 7,
            "current_score": 55,
            "future_score": 90,
            "rms_plan": "Flashcards",
            "future_goal": "Engineering",
            "updated_at": "2026-10-04 09:00:00"
        })),
        ("GET", "/api/students/8/atoz") => ok(json!({
            "current_score": 50,
            "future_score": 80,
            "rms_plan": "",
            "future_goal": ""
        })),
        ("POST", "/api/students/7/atoz") => ok(json!({"status": "saved"})),
        ("POST", "/api/learning/judy-help") => ok(json!({"hint": "What is rise over run?"})),
        ("POST", "/api/lambda/attempt") => ok(json!({"old_lambda": 1.0, "new_lambda": 0.82})),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_server() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new().fallback(handle).with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/"), state)
}

fn signed_in() -> SessionStore {
    let store = SessionStore::in_memory();
    store
        .set(AuthSession {
            access_token: "tok-ada".to_string(),
            token_type: "bearer".to_string(),
            id: Some(7),
            name: "Ada".to_string(),
            email: "ada@example.test".to_string(),
            role: None,
        })
        .expect("set session");
    store
}

fn backend(base_url: &str, session: SessionStore) -> HttpBackend {
    HttpBackend::with_client(reqwest::Client::new(), base_url, session)
}

#[tokio::test]
async fn login_posts_credentials_without_bearer() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, SessionStore::in_memory());

    let response = backend
        .login(&LoginRequest {
            username: "ada".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect("login");
    let session = response.into_session("ada").expect("session");
    assert_eq!(session.access_token, "tok-ada");
    assert_eq!(session.id, Some(7));

    let request = state.last();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/api/auth/login");
    assert_eq!(request.authorization, None);
    assert_eq!(request.body, json!({"username": "ada", "password": "secret"}));
}

#[tokio::test]
async fn login_failure_surfaces_detail() {
    let (base_url, _state) = spawn_server().await;
    let backend = backend(&base_url, SessionStore::in_memory());

    let err = backend
        .login(&LoginRequest {
            username: "eve".to_string(),
            password: "guess".to_string(),
        })
        .await
        .expect_err("login should fail");
    match err {
        BackendError::Status { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Incorrect username or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn register_defaults_grade_and_falls_back_to_student_id() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, SessionStore::in_memory());

    let response = backend
        .register(&RegisterRequest::new("newbie", "pw", None))
        .await
        .expect("register");
    let session = response.into_session("newbie").expect("session");
    assert_eq!(session.id, Some(8));
    assert_eq!(session.name, "newbie");
    assert_eq!(state.last().body["grade"], "Not Specified");
}

#[tokio::test]
async fn tutor_request_carries_bearer_and_history() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let reply = backend
        .tutor_request(&TutorRequest {
            history: vec![
                WireMessage {
                    role: Role::System,
                    content: "be kind".to_string(),
                },
                WireMessage {
                    role: Role::User,
                    content: "graph y = x".to_string(),
                },
            ],
            student_id: Some(7),
            persona: "samie".to_string(),
            message: "graph y = x".to_string(),
            language: "en".to_string(),
        })
        .await
        .expect("tutor reply");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Let's graph it.");
    assert!(reply.directives.is_none());

    let request = state.last();
    assert_eq!(request.path, "/api/learning/tutor-request");
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok-ada"));
    assert_eq!(request.body["history"][0]["role"], "system");
    assert_eq!(request.body["student_id"], 7);
    assert_eq!(request.body["language"], "en");
}

#[tokio::test]
async fn empty_error_body_uses_status_reason() {
    let (base_url, _state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let err = backend
        .tutor_request(&TutorRequest {
            history: Vec::new(),
            student_id: None,
            persona: "samie".to_string(),
            message: "boom".to_string(),
            language: "en".to_string(),
        })
        .await
        .expect_err("server error");
    match err {
        BackendError::Status { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = backend(&format!("http://{addr}"), SessionStore::in_memory());
    let err = backend
        .login(&LoginRequest {
            username: "ada".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect_err("no server");
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn speech_returns_raw_audio() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let audio = backend
        .speak(&SpeakRequest {
            text: "x equals two".to_string(),
            persona: "samie".to_string(),
        })
        .await
        .expect("audio");
    assert_eq!(audio, b"ID3audio".to_vec());
    assert_eq!(state.last().body, json!({"text": "x equals two", "persona": "samie"}));
}

#[tokio::test]
async fn journal_and_game_endpoints_round_trip() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let entries = backend.diary(7).await.expect("diary");
    assert_eq!(entries[0].entry_date, "2026-10-01");

    let saved = backend
        .save_diary(&DiarySaveRequest {
            student_id: 7,
            date: "2026-10-19".to_string(),
            content: "Practised slopes".to_string(),
        })
        .await
        .expect("save");
    assert_eq!(saved.status, "saved");

    let monsters = backend.monsters(7).await.expect("monsters");
    assert_eq!(monsters.len(), 1);
    assert!(monsters[0].is_boss());
    assert_eq!(monsters[0].hp_current, 40);

    let outcome = backend
        .attack(&AttackRequest {
            student_id: 7,
            monster_id: 3,
            answer: "2".to_string(),
        })
        .await
        .expect("attack");
    assert!(outcome.defeated());
    assert_eq!(outcome.xp_gained, 50);

    let paths: Vec<String> = state
        .requests()
        .into_iter()
        .map(|request| request.path)
        .collect();
    assert_eq!(
        paths,
        vec![
            "/api/diary/7",
            "/api/diary/save",
            "/api/game/7/monsters",
            "/api/game/attack"
        ]
    );
}

#[tokio::test]
async fn dashboard_and_stats_decode() {
    let (base_url, _state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let dashboard = backend.dashboard(7).await.expect("dashboard");
    assert_eq!(dashboard.pq_scores["Focus"], json!(72));
    assert_eq!(dashboard.recent_logs[0].tutor, "samie");

    let stats = backend.rmsq_stats(7).await.expect("stats");
    assert_eq!(stats.graph_data[0].label, "W1");
    assert_eq!(stats.insight.expect("insight").status, "Stable");
}

#[tokio::test]
async fn mentor_board_rejects_non_mentor_before_sending() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let messages = backend.mentor_messages(7).await.expect("messages");
    assert_eq!(messages[0].message, "Great week!");

    let err = backend
        .post_mentor_message(
            7,
            &MentorMessageRequest {
                sender_id: "st-12".to_string(),
                sender_name: "Sneaky".to_string(),
                message: "hi".to_string(),
            },
        )
        .await
        .expect_err("not a mentor");
    assert!(matches!(err, BackendError::InvalidMentorId(_)));
    assert_eq!(state.requests().len(), 1);

    let err = backend
        .post_mentor_message(
            7,
            &MentorMessageRequest {
                sender_id: " mt1".to_string(),
                sender_name: "Padded".to_string(),
                message: "hi".to_string(),
            },
        )
        .await
        .expect_err("padded id is not a mentor id");
    assert!(matches!(err, BackendError::InvalidMentorId(id) if id == " mt1"));
    assert_eq!(state.requests().len(), 1);

    let reply = backend
        .post_mentor_message(
            7,
            &MentorMessageRequest {
                sender_id: "MT-01".to_string(),
                sender_name: "Mr. Lee".to_string(),
                message: "Keep it up".to_string(),
            },
        )
        .await
        .expect("post");
    assert_eq!(reply.status, "sent");
    assert_eq!(state.last().body["sender_id"], "MT-01");
}

#[tokio::test]
async fn waterfall_reads_and_posts_full_history() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let waterfall = backend.pq_waterfall(7).await.expect("waterfall");
    assert_eq!(
        WaterfallEntry::running_totals(&waterfall["Homework"]),
        vec![50.0, 55.0]
    );
    assert_eq!(waterfall["Review"].len(), 1);

    let mut history = waterfall["Homework"].clone();
    history.push(WaterfallEntry::new(-3.0));
    let reply = backend
        .update_pq_waterfall(
            7,
            &WaterfallUpdate {
                metric_name: "Homework".to_string(),
                new_entry: WaterfallEntry::new(-3.0),
                full_history: history,
            },
        )
        .await
        .expect("update");
    assert_eq!(reply.status, "saved");

    let request = state.last();
    assert_eq!(request.path, "/api/students/7/pq-waterfall/update");
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok-ada"));
    assert_eq!(request.body["metric_name"], "Homework");
    assert_eq!(request.body["new_entry"], json!({"value": -3.0}));
    assert_eq!(request.body["full_history"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn atoz_round_trip() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let log = backend.atoz(7).await.expect("atoz");
    assert_eq!((log.current_score, log.future_score), (55, 90));
    assert_eq!(log.future_goal, "Engineering");
    assert_eq!(log.updated_at.as_deref(), Some("2026-10-04 09:00:00"));

    let fresh = backend.atoz(8).await.expect("default atoz");
    assert_eq!(fresh.updated_at, None);
    assert_eq!(fresh.rms_plan, "");

    let reply = backend
        .save_atoz(7, &AtozUpdate::clamped(70, 101, "Daily review", "Engineering"))
        .await
        .expect("save");
    assert_eq!(reply.status, "saved");
    assert_eq!(
        state.last().body,
        json!({
            "current_score": 70,
            "future_score": 100,
            "rms_plan": "Daily review",
            "future_goal": "Engineering"
        })
    );
}

#[tokio::test]
async fn hint_and_lambda_attempt_round_trip() {
    let (base_url, state) = spawn_server().await;
    let backend = backend(&base_url, signed_in());

    let hint = backend
        .judy_help(&JudyHelpRequest {
            student_id: 7,
            monster_id: 3,
            student_answer: "3".to_string(),
        })
        .await
        .expect("hint");
    assert_eq!(hint.hint, "What is rise over run?");
    assert_eq!(
        state.last().body,
        json!({"student_id": 7, "monster_id": 3, "student_answer": "3"})
    );

    let outcome = backend
        .lambda_attempt(&LambdaAttemptRequest {
            student_id: 7,
            topic_name: "Linear functions".to_string(),
            correctness: 1,
            latency_tau: 8.0,
            dependency_h: 0,
        })
        .await
        .expect("attempt");
    assert!(outcome.improved());
    assert_eq!(outcome.new_lambda, 0.82);

    let request = state.last();
    assert_eq!(request.path, "/api/lambda/attempt");
    assert_eq!(request.body["topic_name"], "Linear functions");
    assert_eq!(request.body["dependency_h"], 0);
}
