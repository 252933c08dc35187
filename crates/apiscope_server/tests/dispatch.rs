//! JSON-RPC dispatch tests for `apiscope_server`.

use apiscope_protocol::{CallToolResult, JsonRpcResponse, LATEST_PROTOCOL_VERSION};
use apiscope_server::{ServerConfig, ToolServer, build_server};
use apiscope_tools::{CallContext, must_tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const PETSTORE: &str = r#"openapi: "3.0.3"
info:
  title: Petstore
  version: 1.0.0
paths:
  /pets:
    summary: Pets
    get:
      summary: List pets
      operationId: listPets
      responses:
        "200":
          description: A list of pets
    post:
      summary: Create a pet
  /pets/{petId}:
    get:
      summary: Info for a specific pet
      parameters:
        - name: petId
          in: path
          required: true
          schema:
            type: string
"#;

fn petstore() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PETSTORE.as_bytes()).unwrap();
    file
}

async fn server() -> ToolServer {
    build_server(&ServerConfig::default()).await.unwrap()
}

async fn request(server: &ToolServer, id: i64, method: &str, params: Value) -> JsonRpcResponse {
    let line = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string();
    server.handle_message(&line).await.unwrap()
}

async fn call(server: &ToolServer, name: &str, arguments: Value) -> CallToolResult {
    let response = request(
        server,
        1,
        "tools/call",
        json!({"name": name, "arguments": arguments}),
    )
    .await;
    assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
    serde_json::from_value(response.result.unwrap()).unwrap()
}

// ─────────────────────────────────────────────────────────────────────
// 1. Lifecycle
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_echoes_supported_versions() {
    let server = server().await;

    let response = request(&server, 1, "initialize", json!({"protocolVersion": "2024-11-05"})).await;
    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "apiscope");
    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    assert!(result["instructions"].as_str().unwrap().contains("ReadOpenAPIDocument"));

    let response = request(&server, 2, "initialize", json!({"protocolVersion": "1999-01-01"})).await;
    assert_eq!(response.result.unwrap()["protocolVersion"], LATEST_PROTOCOL_VERSION);
}

#[tokio::test]
async fn ping_and_notifications() {
    let server = server().await;
    let response = request(&server, 9, "ping", Value::Null).await;
    assert_eq!(response.result, Some(json!({})));

    let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    assert!(server.handle_message(&notification.to_string()).await.is_none());
}

// ─────────────────────────────────────────────────────────────────────
// 2. Protocol errors
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_json_is_a_parse_error_with_null_id() {
    let server = server().await;
    let response = server.handle_message("{not json").await.unwrap();
    assert_eq!(response.id, None);
    assert_eq!(response.error.unwrap().code, -32700);

    let encoded = serde_json::to_value(server.handle_message("[").await.unwrap()).unwrap();
    assert_eq!(encoded["id"], Value::Null);
}

#[tokio::test]
async fn non_request_objects_are_invalid() {
    let server = server().await;

    let response = server.handle_message("[1, 2]").await.unwrap();
    assert_eq!(response.error.unwrap().code, -32600);

    let response = server
        .handle_message(r#"{"jsonrpc": "2.0", "id": 4}"#)
        .await
        .unwrap();
    assert_eq!(response.id, Some(apiscope_protocol::RequestId::Number(4)));
    assert_eq!(response.error.unwrap().code, -32600);

    let response = server
        .handle_message(r#"{"jsonrpc": "1.0", "id": 5, "method": "ping"}"#)
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32600);
}

#[tokio::test]
async fn unknown_method_and_tool() {
    let server = server().await;

    let response = request(&server, 1, "resources/list", json!({})).await;
    let error = response.error.unwrap();
    assert_eq!(error.code, -32601);
    assert_eq!(error.message, "Method not found: resources/list");

    let response = request(&server, 2, "tools/call", json!({"name": "Missing"})).await;
    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "Unknown tool: Missing");

    let response = request(&server, 3, "tools/call", json!({"arguments": {}})).await;
    assert_eq!(response.error.unwrap().code, -32602);
}

// ─────────────────────────────────────────────────────────────────────
// 3. Bundled tools
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tools_list_reports_every_tool_in_order() {
    let server = server().await;
    let response = request(&server, 1, "tools/list", json!({})).await;
    let tools = response.result.unwrap()["tools"].clone();

    let names: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "ReadOpenAPIDocument",
            "ListAllAPIFromDocument",
            "GetSingleAPIDetail",
            "SendAPIRequest"
        ]
    );

    let read = &tools[0]["inputSchema"];
    assert_eq!(read["type"], "object");
    assert_eq!(read["required"], json!(["openAPIPath"]));
    assert!(read["properties"]["openAPIPath"]["description"].is_string());

    let detail = &tools[2]["inputSchema"];
    assert_eq!(detail["required"], json!(["urlPath", "method"]));
    assert_eq!(
        detail["properties"]["method"]["enum"],
        json!(["get", "put", "post", "delete", "options", "head", "patch", "trace"])
    );

    let send = &tools[3]["inputSchema"];
    assert_eq!(send["required"], json!(["method", "url"]));
}

#[tokio::test]
async fn document_tools_require_a_loaded_document() {
    let server = server().await;

    let result = call(&server, "ListAllAPIFromDocument", json!({})).await;
    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("ReadOpenAPIDocument"));

    let result = call(
        &server,
        "GetSingleAPIDetail",
        json!({"urlPath": "/pets", "method": "get"}),
    )
    .await;
    assert!(result.is_error);
}

#[tokio::test]
async fn read_list_and_detail() {
    let file = petstore();
    let server = server().await;

    let result = call(
        &server,
        "ReadOpenAPIDocument",
        json!({"openAPIPath": file.path()}),
    )
    .await;
    assert_eq!(result, CallToolResult::text("success"));

    let result = call(&server, "ListAllAPIFromDocument", json!({})).await;
    let entries: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
    assert_eq!(entries[0]["url"], "/pets");
    assert_eq!(entries[0]["summary"], "Pets");
    assert_eq!(entries[0]["methods"][1]["method"], "post");
    assert_eq!(entries[1]["url"], "/pets/{petId}");

    let result = call(
        &server,
        "GetSingleAPIDetail",
        json!({"urlPath": "/pets/{petId}", "method": "GET"}),
    )
    .await;
    let operation: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
    assert_eq!(operation["summary"], "Info for a specific pet");
    assert_eq!(operation["parameters"][0]["name"], "petId");
}

#[tokio::test]
async fn detail_lookup_failures_are_tool_errors() {
    let file = petstore();
    let server = server().await;
    call(&server, "ReadOpenAPIDocument", json!({"openAPIPath": file.path()})).await;

    let result = call(
        &server,
        "GetSingleAPIDetail",
        json!({"urlPath": "/pets", "method": "connect"}),
    )
    .await;
    assert_eq!(result, CallToolResult::error("Method connect is not allowed"));

    let result = call(
        &server,
        "GetSingleAPIDetail",
        json!({"urlPath": "/owners", "method": "get"}),
    )
    .await;
    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("/owners"));

    let result = call(
        &server,
        "GetSingleAPIDetail",
        json!({"urlPath": "/pets/{petId}", "method": "delete"}),
    )
    .await;
    assert!(result.is_error);

    let result = call(&server, "GetSingleAPIDetail", json!({"urlPath": "/pets"})).await;
    assert!(result.is_error);
    assert!(result.first_text().unwrap().starts_with("invalid arguments"));
}

#[tokio::test]
async fn failed_read_reports_and_keeps_previous_document() {
    let file = petstore();
    let server = server().await;
    call(&server, "ReadOpenAPIDocument", json!({"openAPIPath": file.path()})).await;

    let result = call(
        &server,
        "ReadOpenAPIDocument",
        json!({"openAPIPath": "/no/such/openapi.yaml"}),
    )
    .await;
    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("/no/such/openapi.yaml"));

    let result = call(&server, "ListAllAPIFromDocument", json!({})).await;
    assert!(!result.is_error);
}

#[tokio::test]
async fn preloaded_document_is_available_immediately() {
    let file = petstore();
    let config = ServerConfig {
        document: Some(file.path().to_path_buf()),
        ..ServerConfig::default()
    };
    let server = build_server(&config).await.unwrap();
    let result = call(&server, "ListAllAPIFromDocument", json!({})).await;
    assert!(!result.is_error);
}

// ─────────────────────────────────────────────────────────────────────
// 4. Cancellation
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
struct WaitArgs {}

fn waiting_server() -> Arc<ToolServer> {
    let tool = must_tool(
        "Wait",
        "Waits until cancelled.",
        |ctx: CallContext, _args: WaitArgs| async move {
            tokio::select! {
                () = ctx.cancelled() => Err::<(), _>("cancelled by client".to_string()),
                () = tokio::time::sleep(Duration::from_secs(30)) => Ok(()),
            }
        },
    );
    Arc::new(ToolServer::builder().tool(tool).build())
}

#[tokio::test]
async fn cancelled_notification_reaches_the_handler() {
    let server = waiting_server();

    let pending = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            let line = r#"{"jsonrpc":"2.0","id":"call-1","method":"tools/call","params":{"name":"Wait"}}"#;
            server.handle_message(line).await.unwrap()
        }
    });

    while server.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let cancel = r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"call-1","reason":"user"}}"#;
    assert!(server.handle_message(cancel).await.is_none());

    let response = pending.await.unwrap();
    let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
    assert_eq!(result, CallToolResult::error("cancelled by client"));
    assert_eq!(server.in_flight(), 0);
}

#[tokio::test]
async fn reused_request_id_is_rejected_while_running() {
    let server = waiting_server();
    let line = r#"{"jsonrpc":"2.0","id":"dup","method":"tools/call","params":{"name":"Wait"}}"#;

    let first = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.handle_message(line).await.unwrap() }
    });
    while server.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = server.handle_message(line).await.unwrap();
    assert_eq!(second.error.unwrap().code, -32600);
    assert_eq!(server.in_flight(), 1);

    let cancel = r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"dup"}}"#;
    assert!(server.handle_message(cancel).await.is_none());

    let response = first.await.unwrap();
    let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
    assert_eq!(result, CallToolResult::error("cancelled by client"));
    assert_eq!(server.in_flight(), 0);
}

#[tokio::test]
async fn cancel_all_reaches_every_running_call() {
    let server = waiting_server();
    let calls: Vec<_> = (1..=2)
        .map(|id| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                let line = json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": "tools/call",
                    "params": {"name": "Wait"}
                })
                .to_string();
                server.handle_message(&line).await.unwrap()
            })
        })
        .collect();
    while server.in_flight() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    server.cancel_all();
    for call in calls {
        let response = call.await.unwrap();
        assert_eq!(response.result.unwrap()["isError"], true);
    }
}

#[tokio::test]
async fn call_timeout_sets_a_deadline() {
    let tool = must_tool(
        "Deadline",
        "Reports whether a deadline is set.",
        |ctx: CallContext, _args: WaitArgs| async move {
            Ok::<_, String>(if ctx.deadline().is_some() { "deadline" } else { "none" })
        },
    );
    let server = ToolServer::builder()
        .call_timeout(Some(Duration::from_secs(5)))
        .tool(tool)
        .build();
    let result = call(&server, "Deadline", json!({})).await;
    assert_eq!(result.first_text(), Some("deadline"));
}
