use chat_provider::{CompletionError, CompletionProvider};

use crate::settings::Settings;

mod openrouter;

pub use openrouter::OpenRouterProvider;

pub fn provider_from_settings(
    settings: &Settings,
) -> Result<Box<dyn CompletionProvider>, CompletionError> {
    let provider = OpenRouterProvider::new(&settings.api_key, &settings.base_url, &settings.model)?;
    Ok(Box::new(provider))
}
