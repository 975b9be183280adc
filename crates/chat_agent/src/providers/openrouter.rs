use std::future::Future;
use std::time::Duration;

use chat_provider::{ChatMessage, CompletionError, CompletionProvider, ModelTurn};
use openrouter_api::{ChatRequest, OpenRouterApiError, OpenRouterClient, OpenRouterConfig};
use serde_json::Value;

/// Hard ceiling on one completion round trip, retries included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// `CompletionProvider` adapter backed by `openrouter_api` transport primitives.
///
/// The agent loop is synchronous; each call bridges into the async client on a
/// throwaway current-thread runtime.
pub struct OpenRouterProvider {
    client: OpenRouterClient,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, CompletionError> {
        if model.trim().is_empty() {
            return Err(CompletionError::new("model id must not be empty"));
        }
        let config = OpenRouterConfig::new(api_key)
            .with_base_url(base_url)
            .with_title("skillchat")
            .with_timeout(REQUEST_TIMEOUT);
        let client = OpenRouterClient::new(config)
            .map_err(|error| CompletionError::new(error.to_string()))?;
        Ok(Self {
            client,
            model: model.trim().to_string(),
        })
    }

    /// Fetches the routable model ids, used to sanity-check settings entry.
    pub fn list_model_ids(&self) -> Result<Vec<String>, CompletionError> {
        let models = block_on(self.client.list_models())
            .map_err(|error| CompletionError::new(error.to_string()))?;
        Ok(models.into_iter().map(|entry| entry.id).collect())
    }
}

impl CompletionProvider for OpenRouterProvider {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ModelTurn, CompletionError> {
        let request = ChatRequest::new(self.model.clone(), messages.to_vec(), tools.to_vec());
        block_on(self.client.create_completion(&request))
            .map_err(|error| CompletionError::new(error.to_string()))
    }
}

fn block_on<F, T>(future: F) -> Result<T, OpenRouterApiError>
where
    F: Future<Output = Result<T, OpenRouterApiError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| {
            OpenRouterApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
        })?;
    runtime.block_on(future)
}
