/// Default base URL for OpenRouter transport requests.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Normalize a base URL for endpoint construction.
///
/// Normalization rules:
/// 1) empty/whitespace input falls back to the default base
/// 2) trailing slashes are stripped
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };
    base.trim_end_matches('/').to_string()
}

/// Chat completions endpoint for a base URL.
pub fn chat_completions_url(base: &str) -> String {
    format!("{}/chat/completions", normalize_base_url(base))
}

/// Model listing endpoint for a base URL.
pub fn models_url(base: &str) -> String {
    format!("{}/models", normalize_base_url(base))
}

#[cfg(test)]
mod tests {
    use super::{chat_completions_url, models_url, normalize_base_url, DEFAULT_BASE_URL};

    #[test]
    fn empty_base_falls_back_to_default() {
        assert_eq!(normalize_base_url(""), DEFAULT_BASE_URL);
        assert_eq!(normalize_base_url("   "), DEFAULT_BASE_URL);
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(
            chat_completions_url("https://example.test/v1/"),
            "https://example.test/v1/chat/completions"
        );
        assert_eq!(
            models_url("https://example.test/v1//"),
            "https://example.test/v1/models"
        );
    }
}
