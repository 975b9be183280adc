//! JSON-RPC 2.0 frames and tool-server result shapes.

use chat_provider::ToolDeclaration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
/// Protocol revision sent during the initialize handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_LIST_TOOLS: &str = "tools/list";
pub const METHOD_CALL_TOOL: &str = "tools/call";

/// Outgoing request or notification frame. Notifications carry no `id`.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn call(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            method: method.into(),
            params: Some(params),
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method: method.into(),
            params: None,
        }
    }
}

/// Incoming response frame. Server-initiated notifications also arrive on the
/// same stream; they deserialize with `id: None` and are skipped by transport.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// One tool capability as advertised by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl From<ToolDescriptor> for ToolDeclaration {
    fn from(descriptor: ToolDescriptor) -> Self {
        Self {
            name: descriptor.name,
            description: descriptor.description,
            input_schema: descriptor.input_schema,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

/// Result payload of one `tools/call`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Concatenates the text blocks, skipping non-text content.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CallToolResult, RpcRequest, RpcResponse, ToolDescriptor};

    #[test]
    fn call_frame_serializes_with_id_and_params() {
        let frame = RpcRequest::call(7, "tools/call", json!({"name": "view"}));
        let value = serde_json::to_value(&frame).expect("frame should serialize");

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["params"]["name"], "view");
    }

    #[test]
    fn notification_frame_omits_id_and_params() {
        let frame = RpcRequest::notification("notifications/initialized");
        let value = serde_json::to_value(&frame).expect("frame should serialize");

        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
    }

    #[test]
    fn response_without_id_marks_server_notification() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{}}"#,
        )
        .expect("notification should deserialize");

        assert!(response.id.is_none());
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[test]
    fn descriptor_maps_input_schema_field() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({
            "name": "view",
            "description": "Reads a file",
            "inputSchema": {"type": "object"}
        }))
        .expect("descriptor should deserialize");

        let declaration: chat_provider::ToolDeclaration = descriptor.into();
        assert_eq!(declaration.name, "view");
        assert_eq!(declaration.input_schema, json!({"type": "object"}));
    }

    #[test]
    fn joined_text_skips_non_text_blocks() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "zzzz"},
                {"type": "text", "text": "line two"}
            ]
        }))
        .expect("result should deserialize");

        assert_eq!(result.joined_text(), "line one\nline two");
        assert!(!result.is_error);
    }
}
