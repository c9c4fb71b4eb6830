//! MCP session
//!
//! A [`Session`] owns one channel for its whole lifetime. Frames are handled
//! strictly in order: each one is decoded, dispatched and answered before the
//! next is read. Every failure becomes an error response on the same channel;
//! only the channel closing ends the session.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::{McpError, PricingMcpError};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::schema::validate;
use crate::mcp::transport::Transport;
use crate::mcp::types::*;

/// Name reported in `initialize`
pub const SERVER_NAME: &str = "azure-pricing-mcp";

/// Version reported in `initialize`
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Query Azure retail prices: look up service prices, compare regions, \
search SKUs, list service families and estimate savings plan benefits.";

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, `initialize` not yet received
    Uninitialized,
    /// `initialize` answered
    Initialized,
    /// Channel gone; terminal
    Closed,
}

/// One client connection
pub struct Session<T> {
    id: u64,
    transport: T,
    registry: Arc<ToolRegistry>,
    state: SessionState,
    tool_timeout: Duration,
}

impl<T: Transport> Session<T> {
    /// Create a session over a freshly connected channel
    pub fn new(id: u64, transport: T, registry: Arc<ToolRegistry>, tool_timeout: Duration) -> Self {
        Self {
            id,
            transport,
            registry,
            state: SessionState::Uninitialized,
            tool_timeout,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve frames until the channel closes, then return the final state
    #[tracing::instrument(name = "session", skip_all, fields(id = self.id))]
    pub async fn run(mut self) -> SessionState {
        info!("session opened");

        while let Some(frame) = self.transport.recv().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "channel read failed");
                    break;
                }
            };

            let Some(response) = self.handle_frame(&frame).await else {
                continue;
            };

            if let Err(e) = self.transport.send(encode(&response)).await {
                warn!(error = %e, "channel write failed, dropping response");
                break;
            }
        }

        self.state = SessionState::Closed;
        info!("session closed");
        self.state
    }

    /// Handle one inbound frame; `None` means nothing is sent back
    pub async fn handle_frame(&mut self, frame: impl AsRef<[u8]>) -> Option<JsonRpcResponse> {
        if self.state == SessionState::Closed {
            return None;
        }

        match Incoming::decode(frame) {
            Err(response) => {
                debug!("rejecting undecodable frame");
                Some(response)
            }
            Ok(Incoming::Notification(note)) => {
                self.handle_notification(&note.method);
                None
            }
            // Never answered, even when the client attached an id
            Ok(Incoming::Request(request)) if request.method == methods::INITIALIZED => {
                self.handle_notification(&request.method);
                None
            }
            Ok(Incoming::Request(request)) => Some(self.handle_request(request).await),
        }
    }

    fn handle_notification(&self, method: &str) {
        match method {
            methods::INITIALIZED => debug!("client acknowledged initialization"),
            other => debug!(method = other, "ignoring notification"),
        }
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "dispatching request");
        let id = request.id;

        match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(id),
            methods::LIST_TOOLS => respond(
                id,
                &ListToolsResult {
                    tools: self.registry.list(),
                },
            ),
            methods::CALL_TOOL => self.handle_call_tool(id, request.params).await,
            methods::PING => JsonRpcResponse::success(id, json!({})),
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        }
    }

    fn handle_initialize(&mut self, id: Option<RequestId>) -> JsonRpcResponse {
        if self.state == SessionState::Initialized {
            info!("repeated initialize accepted");
        }
        self.state = SessionState::Initialized;

        respond(
            id,
            &InitializeResult {
                protocol_version: MCP_VERSION.to_string(),
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: SERVER_VERSION.to_string(),
                },
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                },
                instructions: Some(INSTRUCTIONS.to_string()),
            },
        )
    }

    async fn handle_call_tool(
        &mut self,
        id: Option<RequestId>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let registry = self.registry.clone();
        let tool_timeout = self.tool_timeout;

        let params: CallToolParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tool call parameters: {}", e)),
                )
            }
        };

        let Some(tool) = registry.lookup(&params.name) else {
            debug!(tool = %params.name, "unknown tool");
            return JsonRpcResponse::error(id, JsonRpcError::tool_not_found(&params.name));
        };

        let input = match validate(tool.schema(), &params.arguments) {
            Ok(input) => input,
            Err(e) => {
                debug!(tool = tool.name(), field = e.field(), "invalid arguments");
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(e.to_string())
                        .with_data(json!({ "field": e.field() })),
                );
            }
        };

        let call = AssertUnwindSafe(tool.call(input)).catch_unwind();
        match tokio::time::timeout(tool_timeout, call).await {
            Ok(Ok(Ok(text))) => respond(id, &CallToolResult::text(text)),
            Ok(Ok(Err(e))) => {
                warn!(tool = tool.name(), error = %e, "tool failed");
                JsonRpcResponse::error(id, tool_error(e))
            }
            Ok(Err(_panic)) => {
                error!(tool = tool.name(), "tool panicked");
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::execution_error(format!(
                        "Tool {} failed with an internal fault",
                        tool.name()
                    )),
                )
            }
            Err(_elapsed) => {
                let err = McpError::ToolTimeout {
                    secs: tool_timeout.as_secs(),
                };
                warn!(tool = tool.name(), "{}", err);
                JsonRpcResponse::error(id, JsonRpcError::execution_error(err.to_string()))
            }
        }
    }
}

/// Map an error raised while running a tool to its protocol error
fn tool_error(err: PricingMcpError) -> JsonRpcError {
    match err {
        PricingMcpError::Validation(e) => {
            JsonRpcError::invalid_params(e.to_string()).with_data(json!({ "field": e.field() }))
        }
        other => JsonRpcError::execution_error(other.to_string()),
    }
}

/// Success response carrying a serialized payload
fn respond<S: Serialize>(id: Option<RequestId>, payload: &S) -> JsonRpcResponse {
    match serde_json::to_value(payload) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!(error = %e, "failed to serialize result");
            JsonRpcResponse::error(
                id,
                JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)),
            )
        }
    }
}

/// Encode a response frame
fn encode(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!(error = %e, "failed to encode response");
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": Value::Null,
            "error": {
                "code": codes::INTERNAL_ERROR,
                "message": format!("Failed to encode response: {}", e)
            }
        })
        .to_string()
    })
}
