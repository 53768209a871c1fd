//! Wire types for the local (Ollama-style) chat protocol.

use crate::types::Message;
use serde::{Deserialize, Serialize};

/// Request payload for the local chat endpoint. Unlike the cloud protocol,
/// sampling options nest under an `options` object.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
}

/// Optional model-level parameters, with the local server's field names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// The local server calls max tokens "num_predict".
    #[serde(rename = "num_predict", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

/// The assistant message inside a response or chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Full (non-streaming) response from the local chat endpoint.
///
/// The eval counts double as usage statistics: the protocol has no token
/// accounting of its own, so prompt/completion tokens are approximated from
/// `prompt_eval_count` / `eval_count`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub message: ResponseMessage,
    pub done: bool,
    #[serde(default)]
    pub total_duration: i64,
    #[serde(default)]
    pub load_duration: i64,
    #[serde(default)]
    pub prompt_eval_count: u32,
    #[serde(default)]
    pub prompt_eval_duration: i64,
    #[serde(default)]
    pub eval_count: u32,
    #[serde(default)]
    pub eval_duration: i64,
}

/// One NDJSON line of a streaming response: the same shape as the full
/// response, with `done = false` until the terminal line. `done` is a
/// required field — a line without it is malformed.
pub type StreamChunk = CompletionResponse;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn test_request_renames_max_tokens() {
        let request = CompletionRequest {
            model: "llama3:8b".to_string(),
            messages: vec![Message::user("Hi")],
            stream: true,
            options: Some(ModelOptions {
                max_tokens: Some(64),
                ..Default::default()
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["num_predict"], 64);
        assert!(json["options"].get("temperature").is_none());
    }

    #[test]
    fn test_chunk_requires_done() {
        let missing_done = r#"{"message":{"content":"Hi"}}"#;
        assert!(serde_json::from_str::<StreamChunk>(missing_done).is_err());

        let chunk: StreamChunk =
            serde_json::from_str(r#"{"message":{"content":"Hi"},"done":false}"#).unwrap();
        assert!(!chunk.done);
        assert_eq!(chunk.message.content, "Hi");
    }

    #[test]
    fn test_terminal_chunk_carries_eval_counts() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"model":"llama3:8b","message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":10,"eval_count":20}"#,
        )
        .unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.prompt_eval_count, 10);
        assert_eq!(chunk.eval_count, 20);
    }
}
