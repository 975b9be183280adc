//! Provider-agnostic contract for one model completion exchange.
//!
//! This crate intentionally defines only the shared message history model, the
//! tool-calling envelopes, and the completion interface. It excludes provider
//! transport details, protocol payloads, and turn orchestration concerns.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of one history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One chat history item in the model API wire shape.
///
/// `content` stays optional because assistant messages that only request tool
/// calls carry no text. `tool_calls` with a raw-string `arguments` field is
/// kept verbatim from the wire: the model may emit arguments that are not
/// valid JSON, and that failure belongs to tool dispatch, not deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatMessage {
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(text.into()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(text.into()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(text.into()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// Constructs the tool message answering one requested call.
    #[must_use]
    pub fn tool_result(call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(text.into()),
            tool_call_id: Some(call_id.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Returns the message text, or an empty string when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// One tool invocation requested by the model, in the wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    #[serde(rename = "type", default = "function_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

impl ToolCallRequest {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: function_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name plus the raw argument payload as emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON object encoded as a string. Not guaranteed to parse.
    pub arguments: String,
}

/// Generic tool capability advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

impl ToolDeclaration {
    /// Rewrites this declaration into the model API's function-declaration shape.
    #[must_use]
    pub fn to_function_declaration(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description.clone().unwrap_or_default(),
                "parameters": self.input_schema,
            }
        })
    }
}

/// Outcome of one completion request, split by whether the model wants tools.
///
/// A reply with zero tool calls is the only way a turn ends, so the two cases
/// are distinct variants rather than a message with an optional list.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// Terminal assistant reply for this turn.
    FinalReply { text: String },
    /// The model requested tool invocations, optionally alongside text.
    ToolRequest {
        text: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
}

impl ModelTurn {
    /// Returns the requested calls, empty for a final reply.
    #[must_use]
    pub fn calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::FinalReply { .. } => &[],
            Self::ToolRequest { calls, .. } => calls,
        }
    }

    /// Converts the turn into the assistant history message it represents.
    #[must_use]
    pub fn to_message(&self) -> ChatMessage {
        match self {
            Self::FinalReply { text } => ChatMessage::assistant(text.clone()),
            Self::ToolRequest { text, calls } => ChatMessage {
                role: Role::Assistant,
                content: text.clone(),
                tool_call_id: None,
                tool_calls: calls.clone(),
            },
        }
    }
}

/// Error returned while constructing a provider or executing a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionError {
    message: String,
}

impl CompletionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CompletionError {}

impl From<String> for CompletionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CompletionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Provider interface for executing one completion request.
///
/// `tools` carries function declarations already in the provider wire shape;
/// callers cache them once per connection and pass the same slice every call.
pub trait CompletionProvider: Send + 'static {
    /// Returns the active model identifier.
    fn model_id(&self) -> String;

    /// Executes one completion over the full history and returns the parsed turn.
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ModelTurn, CompletionError>;
}
