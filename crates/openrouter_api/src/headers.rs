use std::collections::BTreeMap;

use crate::config::OpenRouterConfig;
use crate::error::OpenRouterApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_REFERER: &str = "HTTP-Referer";
pub const HEADER_TITLE: &str = "X-Title";
pub const HEADER_USER_AGENT: &str = "User-Agent";

/// Build a deterministic header map for OpenRouter transport requests.
pub fn build_headers(
    config: &OpenRouterConfig,
) -> Result<BTreeMap<String, String>, OpenRouterApiError> {
    if config.api_key.trim().is_empty() {
        return Err(OpenRouterApiError::MissingApiKey);
    }

    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {}", config.api_key.trim()),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    if let Some(referer) = config.referer.as_deref().map(str::trim) {
        if !referer.is_empty() {
            headers.insert(HEADER_REFERER.to_owned(), referer.to_owned());
        }
    }
    if let Some(title) = config.title.as_deref().map(str::trim) {
        if !title.is_empty() {
            headers.insert(HEADER_TITLE.to_owned(), title.to_owned());
        }
    }
    if let Some(user_agent) = config.user_agent.as_deref().map(str::trim) {
        if !user_agent.is_empty() {
            headers.insert(HEADER_USER_AGENT.to_owned(), user_agent.to_owned());
        }
    }

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_owned(), value.trim().to_owned());
    }

    Ok(headers)
}
