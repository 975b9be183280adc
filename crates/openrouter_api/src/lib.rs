//! Transport-only OpenRouter API client primitives.
//!
//! This crate owns request building, retry, and response parsing for the
//! OpenAI-compatible chat completions and model listing endpoints. It
//! intentionally contains no conversation state and no runtime UI coupling.
//!
//! Response parsing splits the assistant message into
//! [`chat_provider::ModelTurn`] at the wire boundary, so callers never inspect
//! an optional tool-call list themselves.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::OpenRouterClient;
pub use config::OpenRouterConfig;
pub use error::OpenRouterApiError;
pub use payload::{ChatRequest, ModelEntry};
pub use url::{chat_completions_url, models_url, normalize_base_url, DEFAULT_BASE_URL};
