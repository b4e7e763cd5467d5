use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tablechat_core::{ChatMessage, ResultEnvelope, Role, ToolCall, ToolName};
use tablechat_error::{ClientError, ClientErrorKind};
use tablechat_mcp_client::{Answer, CLIENT_SYSTEM_PROMPT, ChatBackend, Orchestrator, ToolExecutor};

/// Replies with a fixed string and records what it was sent.
struct ScriptedModel {
    reply: Result<String, ClientError>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(ClientError::new(ClientErrorKind::Transport(
                "connection refused".to_string(),
            ))),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatBackend for ScriptedModel {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ClientError> {
        self.seen.lock().unwrap().push(messages);
        self.reply.clone()
    }
}

/// Records tool calls and answers with a canned envelope.
#[derive(Default)]
struct RecordingTools {
    calls: Mutex<Vec<ToolCall>>,
    fail: bool,
}

#[async_trait]
impl ToolExecutor for RecordingTools {
    async fn call(&self, call: &ToolCall) -> Result<ResultEnvelope, ClientError> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail {
            return Err(ClientError::new(ClientErrorKind::Api {
                status: 500,
                body: "{\"error\":\"boom\"}".to_string(),
            }));
        }
        Ok(ResultEnvelope::text(format!("ran {}", call.tool)))
    }
}

#[tokio::test]
async fn count_question_reaches_count_tool() {
    let model = ScriptedModel::replying(
        r#"{"tool": "countTableEntities", "arguments": {"filter": "city eq 'Atlanta'"}}"#,
    );
    let tools = Arc::new(RecordingTools::default());
    let orchestrator = Orchestrator::new(model.clone(), tools.clone());

    let answer = orchestrator
        .run("How many entries have city as Atlanta?")
        .await;

    assert_eq!(answer, Answer::Tool(ResultEnvelope::text("ran countTableEntities")));
    let calls = tools.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tool, ToolName::CountTableEntities);
    assert_eq!(calls[0].filter(), Some("city eq 'Atlanta'"));
    assert!(calls[0].top().is_none());
}

#[tokio::test]
async fn conversation_starts_with_client_rules() {
    let model = ScriptedModel::replying("hi");
    let orchestrator = Orchestrator::new(model.clone(), Arc::new(RecordingTools::default()));

    orchestrator.run("Say hello").await;

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0][0].role, Role::System);
    assert_eq!(seen[0][0].content, CLIENT_SYSTEM_PROMPT);
    assert_eq!(seen[0][1], ChatMessage::user("Say hello"));
}

#[tokio::test]
async fn query_question_gets_top_from_question() {
    let model = ScriptedModel::replying(
        "{\"tool\": \"queryTableEntities\", \"arguments\": {\"filter\": \"city eq 'Tokyo'\", \"select\": \"RowKey\"}}\n<|assistant|>\n{\"tool\": \"none\", \"arguments\": {}}",
    );
    let tools = Arc::new(RecordingTools::default());
    let orchestrator = Orchestrator::new(model, tools.clone());

    orchestrator
        .run("Give me 5 rowKeys for entries with city as Tokyo")
        .await;

    let calls = tools.calls.lock().unwrap();
    assert_eq!(calls[0].tool, ToolName::QueryTableEntities);
    assert_eq!(calls[0].filter(), Some("city eq 'Tokyo'"));
    assert_eq!(calls[0].arguments["select"], json!("RowKey"));
    assert_eq!(calls[0].top(), Some(&json!(5)));
}

#[tokio::test]
async fn malformed_output_is_returned_as_text() {
    let raw = "Sure! {\"tool\": \"countTableEntities\"";
    let tools = Arc::new(RecordingTools::default());
    let orchestrator = Orchestrator::new(ScriptedModel::replying(raw), tools.clone());

    assert_eq!(orchestrator.run("count things").await, Answer::Text(raw.to_string()));
    assert!(tools.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concatenated_objects_are_returned_as_text() {
    let raw = "{\"tool\": \"none\", \"arguments\": {}}\n{\"tool\": \"countTableEntities\", \"arguments\": {}}";
    let tools = Arc::new(RecordingTools::default());
    let orchestrator = Orchestrator::new(ScriptedModel::replying(raw), tools.clone());

    assert_eq!(orchestrator.run("hello").await, Answer::Text(raw.to_string()));
    assert!(tools.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_gateway_becomes_inline_error() {
    let orchestrator = Orchestrator::new(
        ScriptedModel::failing(),
        Arc::new(RecordingTools::default()),
    );

    match orchestrator.run("anything").await {
        Answer::Text(text) => {
            assert!(text.starts_with("Error: "));
            assert!(text.contains("connection refused"));
        }
        other => panic!("expected inline error, got {:?}", other),
    }
}

#[tokio::test]
async fn failing_tool_server_becomes_inline_error() {
    let model = ScriptedModel::replying(r#"{"tool": "countTableEntities", "arguments": {}}"#);
    let tools = Arc::new(RecordingTools {
        fail: true,
        ..Default::default()
    });
    let orchestrator = Orchestrator::new(model, tools);

    match orchestrator.run("how many?").await {
        Answer::Text(text) => assert!(text.contains("500")),
        other => panic!("expected inline error, got {:?}", other),
    }
}

#[test]
fn answer_serialises_untagged() {
    assert_eq!(serde_json::to_value(Answer::Text("hi".into())).unwrap(), json!("hi"));
    assert_eq!(
        serde_json::to_value(Answer::Tool(ResultEnvelope::text("3"))).unwrap(),
        json!({"content": [{"type": "text", "text": "3"}]})
    );
}
