//! Transport tests: newline-delimited JSON-RPC over in-memory pipes.

use apiscope_server::{ServerConfig, ToolServer, build_server, serve};
use apiscope_tools::{CallContext, must_tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

fn parse_lines(output: &str) -> Vec<Value> {
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn by_id(responses: &[Value], id: Value) -> &Value {
    responses
        .iter()
        .find(|response| response["id"] == id)
        .unwrap_or_else(|| panic!("no response with id {id}"))
}

#[tokio::test]
async fn answers_every_request_line() {
    let server = Arc::new(build_server(&ServerConfig::default()).await.unwrap());
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
        "this is not json\n",
        r#"{"jsonrpc":"2.0","id":"three","method":"ping"}"#,
        "\n",
    );
    let (writer, mut output) = tokio::io::duplex(64 * 1024);

    serve(server, input.as_bytes(), writer).await.unwrap();

    let mut text = String::new();
    output.read_to_string(&mut text).await.unwrap();
    let responses = parse_lines(&text);
    assert_eq!(responses.len(), 4);

    assert_eq!(
        by_id(&responses, json!(1))["result"]["protocolVersion"],
        "2025-03-26"
    );
    assert_eq!(
        by_id(&responses, json!(2))["result"]["tools"]
            .as_array()
            .unwrap()
            .len(),
        4
    );
    assert_eq!(by_id(&responses, json!("three"))["result"], json!({}));
    assert_eq!(by_id(&responses, Value::Null)["error"]["code"], -32700);
}

#[tokio::test]
async fn empty_input_writes_nothing() {
    let server = Arc::new(ToolServer::builder().build());
    let (writer, mut output) = tokio::io::duplex(1024);

    serve(server, &b""[..], writer).await.unwrap();

    let mut text = String::new();
    output.read_to_string(&mut text).await.unwrap();
    assert!(text.is_empty());
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BlockArgs {}

#[tokio::test]
async fn slow_calls_do_not_block_other_requests() {
    let tool = must_tool(
        "Block",
        "Blocks until cancelled.",
        |ctx: CallContext, _args: BlockArgs| async move {
            ctx.cancelled().await;
            Err::<(), _>("stopped")
        },
    );
    let server = Arc::new(ToolServer::builder().tool(tool).build());

    let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
    let (server_out, client_out) = tokio::io::duplex(64 * 1024);
    let serving = tokio::spawn(serve(Arc::clone(&server), server_in, server_out));
    let mut responses = BufReader::new(client_out).lines();

    client_in
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"tools/call\",\"params\":{\"name\":\"Block\"}}\n")
        .await
        .unwrap();
    while server.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    client_in
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":8,\"method\":\"ping\"}\n")
        .await
        .unwrap();
    let first: Value = serde_json::from_str(&responses.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(first["id"], 8);

    client_in
        .write_all(
            b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/cancelled\",\"params\":{\"requestId\":7}}\n",
        )
        .await
        .unwrap();
    let second: Value = serde_json::from_str(&responses.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(second["id"], 7);
    assert_eq!(second["result"]["isError"], true);
    assert_eq!(second["result"]["content"][0]["text"], "stopped");

    drop(client_in);
    serving.await.unwrap().unwrap();
    assert!(responses.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn running_calls_are_cancelled_after_the_shutdown_grace() {
    let tool = must_tool(
        "Block",
        "Blocks until cancelled.",
        |ctx: CallContext, _args: BlockArgs| async move {
            ctx.cancelled().await;
            Err::<(), _>("stopped")
        },
    );
    let server = Arc::new(
        ToolServer::builder()
            .shutdown_grace(Duration::from_millis(50))
            .tool(tool)
            .build(),
    );
    let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"Block\"}}\n";
    let (writer, mut output) = tokio::io::duplex(64 * 1024);

    tokio::time::timeout(Duration::from_secs(5), serve(server, input.as_bytes(), writer))
        .await
        .expect("serve returns once the grace has passed")
        .unwrap();

    let mut text = String::new();
    output.read_to_string(&mut text).await.unwrap();
    let responses = parse_lines(&text);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["result"]["isError"], true);
    assert_eq!(responses[0]["result"]["content"][0]["text"], "stopped");
}

#[tokio::test]
async fn calls_ignoring_cancellation_are_aborted() {
    let tool = must_tool(
        "Sleep",
        "Sleeps without watching for cancellation.",
        |_ctx: CallContext, _args: BlockArgs| async move {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok::<_, String>("woke up")
        },
    );
    let server = Arc::new(
        ToolServer::builder()
            .shutdown_grace(Duration::from_millis(20))
            .tool(tool)
            .build(),
    );
    let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"Sleep\"}}\n";
    let (writer, mut output) = tokio::io::duplex(64 * 1024);

    tokio::time::timeout(
        Duration::from_secs(5),
        serve(Arc::clone(&server), input.as_bytes(), writer),
    )
    .await
    .expect("serve returns after aborting the call")
    .unwrap();

    let mut text = String::new();
    output.read_to_string(&mut text).await.unwrap();
    assert!(text.is_empty());
    assert_eq!(server.in_flight(), 0);
}

#[tokio::test]
async fn retrying_request_does_not_hold_shutdown() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = ServerConfig::default();
    config.http.retry_delay = Duration::from_millis(1);
    config.shutdown_grace = Duration::from_millis(200);
    let server = Arc::new(build_server(&config).await.unwrap());

    let input = format!(
        "{}\n",
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": "SendAPIRequest",
                "arguments": {"method": "GET", "url": format!("http://{addr}/"), "maxRetries": 4_000_000_000_u32}
            }
        })
    );
    let (writer, mut output) = tokio::io::duplex(64 * 1024);

    tokio::time::timeout(Duration::from_secs(5), serve(server, input.as_bytes(), writer))
        .await
        .expect("serve returns after end of input")
        .unwrap();

    let mut text = String::new();
    output.read_to_string(&mut text).await.unwrap();
    let responses = parse_lines(&text);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["result"]["isError"], true);
}
