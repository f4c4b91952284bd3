use dreamarc_protocol::{AuthResponse, Role, TutorReply};

/// Plain assistant reply without directives.
pub fn text_reply(content: impl Into<String>) -> TutorReply {
    TutorReply {
        role: Role::Assistant,
        content: content.into(),
        directives: None,
    }
}

/// Reply embedding a two-point graph tag after `lead`.
pub fn graph_reply(lead: &str, title: &str) -> TutorReply {
    text_reply(format!(
        r#"{lead} :::GRAPH_DATA {{"title": "{title}", "data": [{{"x": 0, "y": 0}}, {{"x": 1, "y": 2}}]}} :::"#
    ))
}

/// Reply embedding a one-question quiz whose answer is the second option.
pub fn quiz_reply(lead: &str) -> TutorReply {
    text_reply(format!(
        r#"{lead} :::QUIZ_DATA [{{"question": "2x = 4, x = ?", "options": ["1", "2"], "correct_index": 1, "explanation": "Divide both sides by 2."}}] :::"#
    ))
}

/// Successful login payload for student `id`.
pub fn auth_response(id: i64, name: &str) -> AuthResponse {
    AuthResponse {
        access_token: Some(format!("token-{id}")),
        token_type: Some("bearer".to_string()),
        id: Some(id),
        name: Some(name.to_string()),
        role: Some("student".to_string()),
        ..AuthResponse::default()
    }
}
