use serde_json::json;
use tablechat_core::{ChatMessage, ContentBlock, ResultEnvelope, Role, ToolCall, ToolName};

#[test]
fn chat_message_uses_lowercase_roles() {
    let message = ChatMessage::system("rules");
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({"role": "system", "content": "rules"})
    );

    let parsed: ChatMessage =
        serde_json::from_value(json!({"role": "user", "content": "hi"})).unwrap();
    assert_eq!(parsed.role, Role::User);
}

#[test]
fn unknown_role_is_rejected() {
    let parsed = serde_json::from_value::<ChatMessage>(json!({"role": "tool", "content": "x"}));
    assert!(parsed.is_err());
}

#[test]
fn envelope_has_fixed_shape() {
    let envelope = ResultEnvelope::text("The table contains 3 entities");
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({"content": [{"type": "text", "text": "The table contains 3 entities"}]})
    );
}

#[test]
fn envelope_round_trips_from_server_json() {
    let envelope: ResultEnvelope = serde_json::from_value(json!({
        "content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]
    }))
    .unwrap();
    assert_eq!(envelope.content.len(), 2);
    assert_eq!(
        envelope.content[0],
        ContentBlock::Text {
            text: "a".to_string()
        }
    );
    assert_eq!(envelope.joined_text(), "a\nb");
}

#[test]
fn unknown_tool_name_fails_to_parse() {
    let parsed = serde_json::from_value::<ToolCall>(json!({
        "tool": "deleteTableEntities",
        "arguments": {}
    }));
    assert!(parsed.is_err());
}

#[test]
fn count_tool_only_accepts_filter() {
    assert_eq!(ToolName::CountTableEntities.allowed_arguments(), &["filter"]);
    assert_eq!(
        ToolName::QueryTableEntities.allowed_arguments(),
        &["filter", "top", "select"]
    );
}
