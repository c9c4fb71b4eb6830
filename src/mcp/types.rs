//! MCP protocol type definitions
//!
//! Types for the Model Context Protocol used for tool invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC error codes
pub mod codes {
    /// The frame is not valid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// The frame is JSON but not a request envelope
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method, or `tools/call` naming an unregistered tool
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Arguments failed validation
    pub const INVALID_PARAMS: i32 = -32602;
    /// Fault inside the server itself
    pub const INTERNAL_ERROR: i32 = -32603;
    /// The tool ran and failed (upstream error, timeout)
    pub const EXECUTION_ERROR: i32 = -32000;
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,

    /// Request ID; `None` when the client sent an explicit `null`
    pub id: Option<RequestId>,

    /// Method name
    pub method: String,

    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: String,

    /// Request ID, `null` when it could not be recovered
    pub id: Option<RequestId>,

    /// Result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Whether this response carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC notification (no id, no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,

    /// Method name
    pub method: String,

    /// Parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// Request ID (can be string or any JSON number)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(serde_json::Number),
}

/// A decoded inbound frame
#[derive(Debug, Clone)]
pub enum Incoming {
    /// Expects exactly one response
    Request(JsonRpcRequest),
    /// Never answered
    Notification(JsonRpcNotification),
}

impl Incoming {
    /// Decode one frame
    ///
    /// A frame without an `id` member is a notification. Bytes that are not
    /// UTF-8 JSON are a parse error. On any other failure the returned error
    /// response carries whatever id could be recovered.
    pub fn decode(frame: impl AsRef<[u8]>) -> std::result::Result<Self, JsonRpcResponse> {
        let value: Value = serde_json::from_slice(frame.as_ref()).map_err(|e| {
            JsonRpcResponse::error(None, JsonRpcError::parse_error(format!("Parse error: {}", e)))
        })?;

        let recovered_id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

        let is_request = value.as_object().is_some_and(|obj| obj.contains_key("id"));

        let decoded = if is_request {
            serde_json::from_value::<JsonRpcRequest>(value).map(Incoming::Request)
        } else {
            serde_json::from_value::<JsonRpcNotification>(value).map(Incoming::Notification)
        };

        decoded.map_err(|e| {
            JsonRpcResponse::error(
                recovered_id,
                JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
            )
        })
    }
}

/// JSON-RPC error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,

    /// Error message
    pub message: String,

    /// Additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: codes::PARSE_ERROR,
            message: message.into(),
            data: None,
        }
    }

    /// Invalid request (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: codes::INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: codes::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method.into()),
            data: None,
        }
    }

    /// Tool not found, reported in the method-not-found class (-32601)
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: codes::METHOD_NOT_FOUND,
            message: format!("Unknown tool: {}", name),
            data: Some(serde_json::json!({ "tool": name })),
        }
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: codes::INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    /// Internal error (-32603)
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: codes::INTERNAL_ERROR,
            message: message.into(),
            data: None,
        }
    }

    /// Tool execution failure (-32000)
    pub fn execution_error(message: impl Into<String>) -> Self {
        Self {
            code: codes::EXECUTION_ERROR,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// MCP server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,

    /// Server version
    pub version: String,
}

/// MCP server capabilities
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Tool capabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability marker
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// The tool set never changes at runtime
    pub list_changed: bool,
}

/// Initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version
    pub protocol_version: String,

    /// Server info
    pub server_info: ServerInfo,

    /// Server capabilities
    pub capabilities: ServerCapabilities,

    /// Usage hints for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Behavioural hints attached to a tool listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
    pub destructive_hint: bool,
    pub idempotent_hint: bool,
    pub open_world_hint: bool,
}

impl ToolAnnotations {
    /// Hints for a tool that only reads from an external service
    pub const READ_ONLY_REMOTE: Self = Self {
        read_only_hint: true,
        destructive_hint: false,
        idempotent_hint: true,
        open_world_hint: true,
    };
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Tool name
    pub name: String,

    /// Display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Tool description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Input schema (JSON Schema)
    pub input_schema: Value,

    /// Behavioural hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// List tools result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Available tools
    pub tools: Vec<Tool>,
}

/// Call tool params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool name
    pub name: String,

    /// Tool arguments
    #[serde(default)]
    pub arguments: Value,
}

/// Tool result content item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ToolResultContent {
    /// Text content
    #[serde(rename = "text")]
    Text { text: String },
}

/// Call tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Result content
    pub content: Vec<ToolResultContent>,

    /// Whether the tool call resulted in an error
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
            is_error: false,
        }
    }
}

/// MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
    pub const PING: &str = "ping";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize() {
        let json = r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.id, Some(RequestId::Number(1.into())));
    }

    #[test]
    fn test_response_serialize() {
        let resp = JsonRpcResponse::success(
            Some(RequestId::String("abc".to_string())),
            serde_json::json!({"test": true}),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"result\""));
        assert!(json.contains("\"id\":\"abc\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_error_response_with_null_id() {
        let resp = JsonRpcResponse::error(None, JsonRpcError::parse_error("Parse error"));
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value["id"].is_null());
        assert_eq!(value["error"]["code"], codes::PARSE_ERROR);
    }

    #[test]
    fn test_decode_distinguishes_notifications() {
        let note = Incoming::decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(note, Incoming::Notification(_)));

        let req = Incoming::decode(r#"{"jsonrpc":"2.0","id":"x","method":"ping"}"#).unwrap();
        assert!(matches!(req, Incoming::Request(ref r) if r.method == "ping"));
    }

    #[test]
    fn test_decode_parse_error_has_null_id() {
        let err = Incoming::decode("{not json").unwrap_err();
        assert!(err.id.is_none());
        assert_eq!(err.error.unwrap().code, codes::PARSE_ERROR);
    }

    #[test]
    fn test_decode_invalid_utf8_is_parse_error() {
        let err = Incoming::decode(b"{\"id\":1,\"method\":\"ping\",\"x\":\"\xff\xfe\"}").unwrap_err();
        assert!(err.id.is_none());
        assert_eq!(err.error.unwrap().code, codes::PARSE_ERROR);
    }

    #[test]
    fn test_numeric_ids_are_echoed_verbatim() {
        for raw in ["1.5", "18446744073709551615", "-3"] {
            let frame = format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ping"}}"#, raw);
            let Incoming::Request(req) = Incoming::decode(&frame).unwrap() else {
                panic!("expected a request for id {}", raw);
            };
            let resp = JsonRpcResponse::success(req.id, serde_json::json!({}));
            let json = serde_json::to_string(&resp).unwrap();
            assert!(json.contains(&format!("\"id\":{}", raw)), "{}", json);
        }
    }

    #[test]
    fn test_decode_invalid_request_keeps_id() {
        let err = Incoming::decode(r#"{"id": 7, "params": {}}"#).unwrap_err();
        assert_eq!(err.id, Some(RequestId::Number(7.into())));
        assert_eq!(err.error.unwrap().code, codes::INVALID_REQUEST);
    }

    #[test]
    fn test_error_codes_distinct() {
        let all = [
            codes::PARSE_ERROR,
            codes::INVALID_REQUEST,
            codes::METHOD_NOT_FOUND,
            codes::INVALID_PARAMS,
            codes::INTERNAL_ERROR,
            codes::EXECUTION_ERROR,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(*a < 0);
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_tool_result() {
        let result = CallToolResult::text("Hello");
        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
    }
}
