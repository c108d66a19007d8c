use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::handler::catalog::tool_catalog;
use crate::handler::tools::ToolRunner;
use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse};
use crate::protocol::methods::{
    Capabilities, InitializeParams, InitializeResult, ServerInfo, ToolCallParams, ToolListResult,
};

/// Tool-protocol revision the agent speaks.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Dispatcher handles incoming JSON-RPC requests and routes them
/// to the appropriate handler function.
pub struct Dispatcher {
    tools: ToolRunner,
    initialized: bool,
}

/// The result of dispatching a request: either a success or error response.
#[derive(Debug)]
pub enum DispatchResult {
    Success(JsonRpcResponse),
    Error(JsonRpcErrorResponse),
}

impl DispatchResult {
    /// Serialize the result to a JSON `Value`.
    pub fn to_json(&self) -> Value {
        let encoded = match self {
            Self::Success(resp) => serde_json::to_value(resp),
            Self::Error(resp) => serde_json::to_value(resp),
        };
        encoded.unwrap_or_else(|e| {
            json!({
                "jsonrpc": "2.0",
                "error": {"code": errors::INTERNAL_ERROR, "message": e.to_string()},
                "id": null,
            })
        })
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::Error(JsonRpcErrorResponse::new(id, code, message))
    }

    fn success<T: Serialize>(id: Value, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::Success(JsonRpcResponse::new(id, value)),
            Err(e) => Self::error(id, errors::INTERNAL_ERROR, e.to_string()),
        }
    }
}

impl Dispatcher {
    pub fn new(tools: ToolRunner) -> Self {
        Self {
            tools,
            initialized: false,
        }
    }

    /// Dispatch a parsed JSON-RPC message.
    ///
    /// Returns `None` for notifications, which are never answered.
    pub async fn dispatch(&mut self, request: JsonRpcRequest) -> Option<DispatchResult> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };
        let method = request.method.as_str();

        debug!("Dispatching method: {}", method);

        // The `initialize` method is always allowed
        if method == "initialize" {
            return Some(self.handle_initialize(id, request.params));
        }

        // All other methods require initialization
        if !self.initialized {
            return Some(DispatchResult::error(
                id,
                errors::NOT_INITIALIZED,
                "Agent not initialized, call 'initialize' first",
            ));
        }

        let result = match method {
            "ping" => DispatchResult::success(id, &json!({})),
            "tools/list" => DispatchResult::success(
                id,
                &ToolListResult {
                    tools: tool_catalog(),
                },
            ),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            _ => {
                warn!("Unknown method: {}", method);
                DispatchResult::error(
                    id,
                    errors::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                )
            }
        };
        Some(result)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => debug!("Client confirmed initialization"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn handle_initialize(&mut self, id: Value, params: Value) -> DispatchResult {
        let params: InitializeParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return DispatchResult::error(
                    id,
                    errors::INVALID_PARAMS,
                    format!("Invalid initialize params: {e}"),
                );
            }
        };

        let client = params
            .client_info
            .map(|c| format!("{} {}", c.name, c.version))
            .unwrap_or_else(|| "unknown client".to_string());
        info!(
            "Initialized by {} (requested protocol {})",
            client.trim(),
            params.protocol_version
        );
        self.initialized = true;

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_info: ServerInfo {
                name: "filemanager-agent".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: Capabilities { tools: json!({}) },
        };
        DispatchResult::success(id, &result)
    }

    async fn handle_tool_call(&self, id: Value, params: Value) -> DispatchResult {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return DispatchResult::error(
                    id,
                    errors::INVALID_PARAMS,
                    format!("Invalid tools/call params: {e}"),
                );
            }
        };

        debug!("Calling tool: {}", params.name);
        match self.tools.call(&params.name, params.arguments).await {
            Ok(result) => DispatchResult::success(id, &result),
            Err(e) => DispatchResult::error(id, e.code(), e.to_string()),
        }
    }
}
