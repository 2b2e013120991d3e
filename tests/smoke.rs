use kudos::error::KudosError;
use kudos::response::{ToolMetadata, ToolResponse};

#[test]
fn tool_response_success_serializes_correctly() {
    let response = ToolResponse::success(
        "signed in as user-1".to_string(),
        ToolMetadata {
            tool_name: "login".to_string(),
            duration_seconds: 0.42,
        },
    );

    let json_str = serde_json::to_string(&response).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["content"], "signed in as user-1");
    assert_eq!(parsed["content_type"], "text");
    assert_eq!(parsed["metadata"]["tool_name"], "login");
    assert!(parsed["metadata"]["duration_seconds"].is_f64());
}

#[test]
fn tool_response_error_serializes_correctly() {
    let response = ToolResponse::error(
        "not signed in — call `login` first".to_string(),
        ToolMetadata {
            tool_name: "record".to_string(),
            duration_seconds: 0.001,
        },
    );

    let json_str = serde_json::to_string(&response).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

    assert_eq!(parsed["status"], "error");
    assert_eq!(parsed["content"], "not signed in — call `login` first");
}

#[test]
fn non_finite_duration_clamps_to_zero() {
    let response = ToolResponse::success(
        "ok".to_string(),
        ToolMetadata {
            tool_name: "wins".to_string(),
            duration_seconds: f64::NAN,
        },
    );

    let parsed: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&response).unwrap()).unwrap();
    assert_eq!(parsed["metadata"]["duration_seconds"], 0.0);
}

#[test]
fn failures_stay_inside_the_envelope() {
    // A failing tool must not become a transport-level error.
    let response = ToolResponse::error(
        "upstream error from storage: 500".to_string(),
        ToolMetadata {
            tool_name: "milestones".to_string(),
            duration_seconds: 1.5,
        },
    );
    let result = response.into_call_tool_result();
    assert_ne!(result.is_error, Some(true));
}

// ---------------------------------------------------------------------------
// error messages shown to clients
// ---------------------------------------------------------------------------

#[test]
fn user_messages_are_actionable() {
    assert_eq!(
        KudosError::AuthRequired.user_message(),
        "not signed in — call `login` first"
    );
    assert_eq!(
        KudosError::NotOwner {
            id: "abc".to_string()
        }
        .user_message(),
        "record not found, or you don't own it"
    );
    assert!(
        KudosError::RateLimited {
            service: "llm".to_string()
        }
        .user_message()
        .contains("try again shortly")
    );
}

#[test]
fn schema_parse_details_do_not_leak() {
    let err = KudosError::SchemaParse("unexpected token at line 3 of https://internal".to_string());
    assert_eq!(err.user_message(), "failed to parse collaborator response");
}

#[test]
fn validation_messages_pass_through() {
    let err = KudosError::Validation("content must not be empty".to_string());
    assert!(err.is_validation());
    assert_eq!(err.user_message(), "content must not be empty");
}

// ---------------------------------------------------------------------------
// tool request schemas accept minimal argument sets
// ---------------------------------------------------------------------------

#[test]
fn entries_request_defaults_are_optional() {
    use kudos::tools::diary::EntriesRequest;

    let req: EntriesRequest = serde_json::from_value(serde_json::json!({})).unwrap();
    assert!(req.date.is_none());
    assert!(req.start.is_none());
    assert!(req.end.is_none());

    let req: EntriesRequest = serde_json::from_value(serde_json::json!({
        "start": "2024-05-01",
        "end": "2024-05-31"
    }))
    .unwrap();
    assert_eq!(req.start.as_deref(), Some("2024-05-01"));
}

#[test]
fn log_win_request_takes_optional_category() {
    use kudos::tools::success::LogWinRequest;

    let req: LogWinRequest =
        serde_json::from_value(serde_json::json!({"content": "完成了演讲"})).unwrap();
    assert_eq!(req.content, "完成了演讲");
    assert!(req.category.is_none());

    let req: LogWinRequest = serde_json::from_value(
        serde_json::json!({"content": "完成了演讲", "category": "工作"}),
    )
    .unwrap();
    assert_eq!(req.category.as_deref(), Some("工作"));
}
