use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tablechat_mcp::{
    AzureTableStore, Entity, McpState, MemoryTableStore, ToolRegistry, create_router,
};
use tower::ServiceExt;

fn entity(value: Value) -> Entity {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn sample_table() -> Vec<Entity> {
    let mut rows = vec![
        entity(json!({"PartitionKey": "us", "RowKey": "1", "Name": "Peach", "city": "Atlanta", "country": "USA"})),
        entity(json!({"PartitionKey": "us", "RowKey": "2", "Name": "Pecan", "city": "Atlanta", "country": "USA"})),
        entity(json!({"PartitionKey": "us", "RowKey": "3", "Name": "Crab", "city": "Baltimore", "country": "USA"})),
        entity(json!({"PartitionKey": "jp", "RowKey": "4", "Name": "Ramen", "city": "Tokyo", "country": "Japan"})),
    ];
    for i in 0..200 {
        rows.push(entity(json!({
            "PartitionKey": "jp",
            "RowKey": format!("t{}", i),
            "Name": format!("Sushi {}", i),
            "city": "Tokyo",
            "country": "Japan"
        })));
    }
    rows
}

fn app_with(store: MemoryTableStore) -> Router {
    let registry = ToolRegistry::with_table_tools(Arc::new(store), "mainData");
    create_router(McpState::new(registry))
}

async fn post_mcp(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn envelope_text(body: &Value) -> String {
    assert_eq!(body["content"][0]["type"], "text");
    body["content"][0]["text"].as_str().unwrap().to_string()
}

fn report(body: &Value) -> Value {
    serde_json::from_str(&envelope_text(body)).unwrap()
}

#[tokio::test]
async fn count_reports_matches_and_echoes_filter() {
    let (status, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "countTableEntities", "arguments": {"filter": "city eq 'Atlanta'"}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        envelope_text(&body),
        "The Azure Table \"mainData\" contains 2 entities matching filter: \"city eq 'Atlanta'\"."
    );
}

#[tokio::test]
async fn count_without_filter_follows_every_page() {
    let store = MemoryTableStore::new(sample_table()).with_page_size(7);
    let (status, body) = post_mcp(
        app_with(store),
        json!({"tool": "countTableEntities", "arguments": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        envelope_text(&body),
        "The Azure Table \"mainData\" contains 204 entities matching filter: \"none\"."
    );
}

#[tokio::test]
async fn count_treats_null_filter_as_absent() {
    let (_, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "countTableEntities", "arguments": {"filter": null}}),
    )
    .await;
    assert!(envelope_text(&body).ends_with("matching filter: \"none\"."));
}

#[tokio::test]
async fn query_caps_top_at_one_hundred() {
    let (status, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table()).with_page_size(30)),
        json!({"tool": "queryTableEntities", "arguments": {"filter": "city eq 'Tokyo'", "top": 500}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let report = report(&body);
    assert_eq!(report["top"], 100);
    assert_eq!(report["resultCount"], 100);
    assert_eq!(report["entities"].as_array().unwrap().len(), 100);
    assert_eq!(report["table"], "mainData");
    assert_eq!(report["filter"], "city eq 'Tokyo'");
    assert_eq!(report["select"], "all");
    assert!(report["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn query_honours_small_top() {
    let (_, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "queryTableEntities", "arguments": {"filter": "city eq 'Tokyo'", "top": "5"}}),
    )
    .await;

    let report = report(&body);
    assert_eq!(report["resultCount"], 5);
    assert_eq!(report["top"], 5);
}

#[tokio::test]
async fn query_projection_lowercases_city_and_adds_row_key() {
    let (_, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "queryTableEntities", "arguments": {"filter": "city eq 'Atlanta'", "select": "City,Name"}}),
    )
    .await;

    let report = report(&body);
    assert_eq!(report["select"], "city,Name,RowKey");
    for row in report["entities"].as_array().unwrap() {
        let mut keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["Name", "RowKey", "city"]);
    }
}

#[tokio::test]
async fn query_without_select_returns_all_fields() {
    let (_, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "queryTableEntities", "arguments": {"filter": "city eq 'Baltimore'"}}),
    )
    .await;

    let report = report(&body);
    assert_eq!(report["resultCount"], 1);
    let row = report["entities"][0].as_object().unwrap();
    for field in ["PartitionKey", "RowKey", "Name", "city", "country"] {
        assert!(row.contains_key(field), "missing {}", field);
    }
}

#[tokio::test]
async fn args_alias_is_accepted_and_arguments_wins() {
    let store = MemoryTableStore::new(sample_table());

    let (_, body) = post_mcp(
        app_with(store.clone()),
        json!({"tool": "countTableEntities", "args": {"filter": "city eq 'Tokyo'"}}),
    )
    .await;
    assert!(envelope_text(&body).contains("contains 201 entities"));

    let (_, body) = post_mcp(
        app_with(store),
        json!({
            "tool": "countTableEntities",
            "arguments": {"filter": "city eq 'Baltimore'"},
            "args": {"filter": "city eq 'Tokyo'"}
        }),
    )
    .await;
    assert!(envelope_text(&body).contains("contains 1 entities"));
}

#[tokio::test]
async fn unknown_tool_is_a_client_error() {
    let (status, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "deleteTableEntities", "arguments": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tool \"deleteTableEntities\" not found.");
}

#[tokio::test]
async fn missing_tool_is_a_client_error() {
    let (status, _) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"arguments": {}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unexpected_argument_is_a_client_error() {
    let (status, body) = post_mcp(
        app_with(MemoryTableStore::new(sample_table())),
        json!({"tool": "countTableEntities", "arguments": {"top": 3}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("top"));
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let app = app_with(MemoryTableStore::new(sample_table()));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_rejection_is_a_server_error_and_connection_is_released() {
    let store = MemoryTableStore::new(sample_table());
    let (status, body) = post_mcp(
        app_with(store.clone()),
        json!({"tool": "queryTableEntities", "arguments": {"filter": "city === Atlanta"}}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("InvalidInput"));
    assert!(!message.contains(" at line "), "leaked location: {}", message);
    assert!(!message.contains(".rs"), "leaked location: {}", message);
    assert_eq!(store.opened(), 1);
    assert_eq!(store.closed(), 1);
}

#[tokio::test]
async fn every_call_opens_and_releases_its_own_connection() {
    let store = MemoryTableStore::new(sample_table());
    let request = json!({"tool": "countTableEntities", "arguments": {"filter": "country eq 'USA'"}});

    let (_, first) = post_mcp(app_with(store.clone()), request.clone()).await;
    let (_, second) = post_mcp(app_with(store.clone()), request).await;

    assert_eq!(first, second);
    assert_eq!(store.opened(), 2);
    assert_eq!(store.closed(), 2);
}

#[tokio::test]
async fn repeated_query_returns_the_same_entities() {
    let store = MemoryTableStore::new(sample_table()).with_page_size(7);
    let request = json!({
        "tool": "queryTableEntities",
        "arguments": {"filter": "city eq 'Tokyo'", "top": 12, "select": "City,Name"}
    });

    let (first_status, first) = post_mcp(app_with(store.clone()), request.clone()).await;
    let (second_status, second) = post_mcp(app_with(store.clone()), request).await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);

    let (first, second) = (report(&first), report(&second));
    assert_eq!(first["resultCount"], 12);
    assert_eq!(first["resultCount"], second["resultCount"]);
    assert_eq!(first["entities"], second["entities"]);
    assert_eq!(first["select"], second["select"]);
    assert_eq!(store.opened(), 2);
    assert_eq!(store.closed(), 2);
}

#[tokio::test]
async fn missing_connection_string_is_a_server_error() {
    let registry = ToolRegistry::with_table_tools(
        Arc::new(AzureTableStore::new(None, "mainData")),
        "mainData",
    );
    let (status, body) = post_mcp(
        create_router(McpState::new(registry)),
        json!({"tool": "countTableEntities", "arguments": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AZURE_STORAGE_CONNECTION_STRING not set");
}

#[tokio::test]
async fn health_and_tool_listing() {
    let app = app_with(MemoryTableStore::new(Vec::new()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/mcp/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let listing: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listing["tools"][0]["name"], "countTableEntities");
    assert_eq!(listing["tools"][1]["name"], "queryTableEntities");
}
