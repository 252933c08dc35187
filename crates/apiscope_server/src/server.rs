//! JSON-RPC dispatch over a frozen tool registry.
//!
//! [`ToolServer`] answers `initialize`, `ping`, `tools/list` and `tools/call`.
//! Each `tools/call` gets its own [`CancellationToken`], registered under the
//! request id for as long as the call runs, so a `notifications/cancelled`
//! from the client reaches the handler through its [`CallContext`].

use apiscope_protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JSON_RPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId,
    ServerCapabilities, ToolDescriptor, ToolsCapability, negotiate_protocol_version,
};
use apiscope_tools::{CallContext, Tool, ToolError, ToolRegistry, Toolset};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Time calls still running at end of input get before they are cancelled.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Parameters of `notifications/cancelled`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelledParams {
    request_id: RequestId,
    #[serde(default)]
    reason: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ToolServerBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Assembles a [`ToolServer`].
///
/// Tools can only be added here; [`build`](Self::build) freezes the registry.
#[derive(Debug)]
pub struct ToolServerBuilder {
    registry: ToolRegistry,
    info: Implementation,
    instructions: Option<String>,
    call_timeout: Option<Duration>,
    shutdown_grace: Duration,
}

impl Default for ToolServerBuilder {
    fn default() -> Self {
        Self {
            registry: ToolRegistry::new(),
            info: Implementation::new("apiscope", env!("CARGO_PKG_VERSION")),
            instructions: None,
            call_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ToolServerBuilder {
    /// Sets the name and version reported by `initialize`.
    #[must_use]
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.info = Implementation::new(name, version);
        self
    }

    /// Sets the usage hints reported by `initialize`.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Gives every call a deadline this far in the future.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets how long calls still running at end of input may take before
    /// they are cancelled.
    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Registers a tool.
    ///
    /// # Panics
    ///
    /// Panics if a tool with the same name is already registered.
    #[must_use]
    pub fn tool(mut self, tool: impl Tool) -> Self {
        self.registry.register(tool);
        self
    }

    /// Registers every tool of a toolset.
    ///
    /// # Panics
    ///
    /// Panics if any tool name is already registered.
    #[must_use]
    pub fn toolset(mut self, toolset: impl Toolset) -> Self {
        self.registry.register_toolset(toolset);
        self
    }

    /// Freezes the registry and creates the server.
    #[must_use]
    pub fn build(self) -> ToolServer {
        tracing::debug!(tools = ?self.registry.names(), "tool registry frozen");
        ToolServer {
            registry: Arc::new(self.registry),
            info: self.info,
            instructions: self.instructions,
            call_timeout: self.call_timeout,
            shutdown_grace: self.shutdown_grace,
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ToolServer
// ─────────────────────────────────────────────────────────────────────────────

/// Protocol-facing dispatcher for registered tools.
#[derive(Debug)]
pub struct ToolServer {
    registry: Arc<ToolRegistry>,
    info: Implementation,
    instructions: Option<String>,
    call_timeout: Option<Duration>,
    shutdown_grace: Duration,
    in_flight: Mutex<HashMap<RequestId, CancellationToken>>,
}

/// Removes a call's token from the in-flight map however the call ends.
struct InFlight<'a> {
    server: &'a ToolServer,
    id: RequestId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.server.in_flight.lock().remove(&self.id);
    }
}

impl ToolServer {
    /// Starts assembling a server.
    #[must_use]
    pub fn builder() -> ToolServerBuilder {
        ToolServerBuilder::default()
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Returns the descriptors of every tool, in registration order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors()
    }

    /// Calls a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for an unknown name. Every other
    /// failure is reported inside the [`CallToolResult`].
    pub async fn call_tool(
        &self,
        name: &str,
        ctx: CallContext,
        args: Option<Value>,
    ) -> Result<CallToolResult, ToolError> {
        let span = tracing::info_span!("tool_call", tool = %name);
        async {
            let result = self.registry.call(name, ctx, args).await;
            match &result {
                Ok(result) => tracing::debug!(is_error = result.is_error, "tool call finished"),
                Err(err) => tracing::warn!(error = %err, "tool call rejected"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Handles one line of input: parses it and dispatches the request.
    ///
    /// Returns `None` when nothing should be written back (notifications and
    /// stray responses).
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "received malformed JSON");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::parse_error(format!("Parse error: {err}")),
                ));
            }
        };

        let Some(object) = value.as_object() else {
            return Some(JsonRpcResponse::failure(
                None,
                JsonRpcError::invalid_request("expected a JSON-RPC request object"),
            ));
        };
        if !object.contains_key("method")
            && (object.contains_key("result") || object.contains_key("error"))
        {
            tracing::debug!("ignoring response sent by the client");
            return None;
        }
        let id = object
            .get("id")
            .and_then(|id| RequestId::deserialize(id).ok());

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(err) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {err}")),
                ));
            }
        };
        if request.jsonrpc != JSON_RPC_VERSION {
            return Some(JsonRpcResponse::failure(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version {:?}",
                    request.jsonrpc
                )),
            ));
        }

        self.handle_request(request).await
    }

    /// Dispatches a parsed request.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        tracing::debug!(%id, method = %request.method, "handling request");
        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            "tools/list" => encode(&ListToolsResult {
                tools: self.list_tools(),
            }),
            "tools/call" => self.tools_call(id.clone(), request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        })
    }

    /// Returns the number of calls currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Returns how long calls still running at end of input may take.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Cancels every running call.
    pub fn cancel_all(&self) {
        let in_flight = self.in_flight.lock();
        if !in_flight.is_empty() {
            tracing::info!(calls = in_flight.len(), "cancelling every running call");
        }
        for token in in_flight.values() {
            token.cancel();
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/cancelled" => {
                let params = request
                    .params
                    .clone()
                    .map(serde_json::from_value::<CancelledParams>);
                match params {
                    Some(Ok(params)) => self.cancel(&params.request_id, params.reason.as_deref()),
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "malformed cancellation notification");
                    }
                    None => tracing::warn!("cancellation notification without params"),
                }
            }
            "notifications/initialized" => tracing::info!("client initialized"),
            other => tracing::debug!(method = %other, "ignoring notification"),
        }
    }

    fn cancel(&self, id: &RequestId, reason: Option<&str>) {
        match self.in_flight.lock().get(id) {
            Some(token) => {
                tracing::info!(%id, reason, "cancelling tool call");
                token.cancel();
            }
            None => tracing::debug!(%id, "cancellation for a call that is not running"),
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = decode_params(params)?;
        if let Some(client) = &params.client_info {
            tracing::info!(client = %client.name, version = %client.version, "client connected");
        }
        encode(&InitializeResult {
            protocol_version: negotiate_protocol_version(params.protocol_version.as_deref())
                .to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn tools_call(
        &self,
        id: RequestId,
        params: Option<Value>,
    ) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = match params {
            Some(params) => serde_json::from_value(params)
                .map_err(|err| JsonRpcError::invalid_params(format!("Invalid params: {err}")))?,
            None => return Err(JsonRpcError::invalid_params("Missing params")),
        };

        let token = CancellationToken::new();
        match self.in_flight.lock().entry(id.clone()) {
            Entry::Occupied(_) => {
                return Err(JsonRpcError::invalid_request(format!(
                    "request id {id} is already in use by a running call"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
            }
        }
        let _guard = InFlight {
            server: self,
            id: id.clone(),
        };

        let mut ctx = CallContext::new()
            .with_request_id(id)
            .with_cancellation(token);
        if let Some(timeout) = self.call_timeout {
            ctx = ctx.with_timeout(timeout);
        }

        match self.call_tool(&params.name, ctx, params.arguments).await {
            Ok(result) => encode(&result),
            Err(err @ ToolError::NotFound(_)) => Err(JsonRpcError::invalid_params(err.to_string())),
            Err(err) => Err(JsonRpcError::internal(err.to_string())),
        }
    }
}

fn decode_params<T: Default + for<'de> Deserialize<'de>>(
    params: Option<Value>,
) -> Result<T, JsonRpcError> {
    match params {
        Some(Value::Null) | None => Ok(T::default()),
        Some(params) => serde_json::from_value(params)
            .map_err(|err| JsonRpcError::invalid_params(format!("Invalid params: {err}"))),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|err| JsonRpcError::internal(err.to_string()))
}
