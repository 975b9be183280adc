use chat_provider::{ChatMessage, ModelTurn, ToolCallRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OpenRouterApiError;

/// Canonical request payload shape for the chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, tools: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Wire shape of a chat completions response, reduced to the fields consumed here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

/// Assistant message inside one choice. An absent `tool_calls` field and an
/// empty list both mean the turn is final.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatResponse {
    /// Splits the first choice into the turn variant it represents.
    pub fn into_model_turn(mut self) -> Result<ModelTurn, OpenRouterApiError> {
        if self.choices.is_empty() {
            return Err(OpenRouterApiError::EmptyCompletion);
        }
        let message = self.choices.remove(0).message;

        if message.tool_calls.is_empty() {
            return Ok(ModelTurn::FinalReply {
                text: message.content.unwrap_or_default(),
            });
        }
        Ok(ModelTurn::ToolRequest {
            text: message.content.filter(|text| !text.is_empty()),
            calls: message.tool_calls,
        })
    }
}

/// Wire shape of the model listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
