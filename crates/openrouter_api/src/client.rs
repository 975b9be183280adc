use chat_provider::ModelTurn;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use crate::config::OpenRouterConfig;
use crate::error::{parse_error_message, OpenRouterApiError};
use crate::headers::build_headers;
use crate::payload::{ChatRequest, ChatResponse, ModelEntry, ModelList};
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::url::{chat_completions_url, models_url};

#[derive(Debug)]
pub struct OpenRouterClient {
    http: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, OpenRouterApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OpenRouterApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    pub fn build_headers(&self) -> Result<HeaderMap, OpenRouterApiError> {
        let headers = build_headers(&self.config)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    OpenRouterApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    OpenRouterApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    fn build_completion_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, OpenRouterApiError> {
        let headers = self.build_headers()?;
        Ok(self
            .http
            .post(chat_completions_url(&self.config.base_url))
            .headers(headers)
            .json(request))
    }

    /// Executes one chat completion and parses the first choice into a turn.
    pub async fn create_completion(
        &self,
        request: &ChatRequest,
    ) -> Result<ModelTurn, OpenRouterApiError> {
        let response = self
            .send_with_retry(|| self.build_completion_request(request))
            .await?;
        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(OpenRouterApiError::from)?;
        parsed.into_model_turn()
    }

    /// Fetches the identifiers of the models the account can route to.
    pub async fn list_models(&self) -> Result<Vec<ModelEntry>, OpenRouterApiError> {
        let headers = self.build_headers()?;
        let response = self
            .send_with_retry(|| {
                Ok(self
                    .http
                    .get(models_url(&self.config.base_url))
                    .headers(headers.clone()))
            })
            .await?;
        let parsed = response
            .json::<ModelList>()
            .await
            .map_err(OpenRouterApiError::from)?;
        Ok(parsed.data)
    }

    async fn send_with_retry<F>(&self, build: F) -> Result<Response, OpenRouterApiError>
    where
        F: Fn() -> Result<reqwest::RequestBuilder, OpenRouterApiError>,
    {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            match build()?.send().await.map_err(OpenRouterApiError::from) {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = response.text().await.unwrap_or_else(|_| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                        tokio::time::sleep(retry_delay_ms(attempt)).await;
                        continue;
                    }
                    return Err(OpenRouterApiError::Status(status, message));
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(retry_delay_ms(attempt)).await;
                        continue;
                    }
                    return Err(OpenRouterApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(OpenRouterApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }
}
