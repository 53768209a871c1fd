use serde::{Deserialize, Serialize};

/// Token usage statistics. Always non-negative; when the backing protocol
/// does not report true token counts they are approximated from its eval
/// counts rather than omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A fully aggregated completion from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The model name the provider reports having used.
    pub model: String,
    pub content: String,
    pub usage: Usage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_deserializes_with_missing_fields() {
        let usage: Usage = serde_json::from_str("{\"prompt_tokens\": 7}").unwrap();
        assert_eq!(usage.prompt_tokens, 7);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 0);
    }
}
