use super::types::{CompletionRequest, CompletionResponse, ModelOptions, StreamChunk};
use crate::decode::{DeltaStream, Frame, FrameDecoder};
use crate::lines::LineStreamExt;
use crate::provider::{ChatProvider, ChatStream};
use crate::types::Usage;
use crate::{ChatOptions, ChatResponse, ChatStreamDelta, Error, Message};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

const PROVIDER_NAME: &str = "local LLM";
const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:8b";
const CHAT_ENDPOINT: &str = "/api/chat";
// Local inference is slow on modest hardware; give one-shot calls more
// headroom than the cloud client.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Chat provider backed by a locally hosted model server speaking the
/// Ollama chat protocol (NDJSON streaming, no credential).
pub struct LocalProvider {
    /// Bounded-timeout client for one-shot exchanges and health probes.
    http: Client,
    /// Client without a total-request timeout for streaming calls.
    streaming_http: Client,
    host: String,
    model: String,
    enabled: bool,
}

impl LocalProvider {
    /// Create a new local provider. Host and model both fall back to the
    /// stock local-server defaults when not configured.
    pub fn new(host: Option<String>, model: Option<String>) -> Result<Self, Error> {
        let host = host
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host.trim_end_matches('/').to_string();

        let model = model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let provider = Self {
            http: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            streaming_http: Client::builder().build()?,
            host,
            model,
            enabled: true,
        };

        info!(host = %provider.host, model = %provider.model, "local LLM chat client initialized");
        Ok(provider)
    }

    fn check_call_input(&self, messages: &[Message]) -> Result<(), Error> {
        if !self.enabled {
            return Err(Error::invalid_input("local provider is not enabled"));
        }
        if messages.is_empty() {
            return Err(Error::invalid_input("at least one message is required"));
        }
        Ok(())
    }

    /// Build the request payload. Options nest under an `options` object,
    /// which is omitted entirely when nothing is set.
    fn build_request(&self, messages: &[Message], stream: bool, options: &ChatOptions) -> CompletionRequest {
        let model_options = if options.is_empty() {
            None
        } else {
            Some(ModelOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_tokens: options.max_tokens,
                stop: options.stop.clone(),
            })
        };

        CompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream,
            options: model_options,
        }
    }

    async fn send(&self, request: &CompletionRequest) -> Result<reqwest::Response, Error> {
        let client = if request.stream {
            &self.streaming_http
        } else {
            &self.http
        };

        let response = client
            .post(format!("{}{}", self.host, CHAT_ENDPOINT))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "local LLM API error");
            return Err(Error::upstream(PROVIDER_NAME, status.as_u16(), body));
        }

        Ok(response)
    }
}

/// Approximate token usage from the protocol's eval counts.
fn usage_from_eval_counts(prompt_eval_count: u32, eval_count: u32) -> Usage {
    Usage {
        prompt_tokens: prompt_eval_count,
        completion_tokens: eval_count,
        total_tokens: prompt_eval_count + eval_count,
    }
}

#[async_trait::async_trait]
impl ChatProvider for LocalProvider {
    async fn completion(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, Error> {
        self.check_call_input(messages)?;

        let request = self.build_request(messages, false, options);
        debug!(
            model = %self.model,
            message_count = messages.len(),
            "sending completion request"
        );

        let response = self.send(&request).await?;
        let raw = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&raw)
            .map_err(|e| Error::protocol(format!("malformed completion response: {e}")))?;

        debug!(
            model = %completion.model,
            eval_count = completion.eval_count,
            "completion response received"
        );

        Ok(ChatResponse {
            model: completion.model,
            content: completion.message.content,
            usage: usage_from_eval_counts(completion.prompt_eval_count, completion.eval_count),
        })
    }

    async fn completion_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatStream, Error> {
        self.check_call_input(messages)?;

        let request = self.build_request(messages, true, options);
        debug!(
            model = %self.model,
            message_count = messages.len(),
            "sending streaming completion request"
        );

        let response = self.send(&request).await?;
        let deltas = DeltaStream::new(response.bytes_stream().lines(), NdjsonDecoder);
        Ok(Box::pin(deltas))
    }

    /// Probes the host root; the local server answers it with a plain
    /// liveness banner.
    async fn health(&self) -> Result<(), Error> {
        if !self.enabled {
            return Err(Error::invalid_input("local provider is not enabled"));
        }

        let response = self.http.get(&self.host).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                PROVIDER_NAME,
                status.as_u16(),
                "health check failed",
            ));
        }

        debug!(host = %self.host, "local LLM health check passed");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Framing rule for the local protocol: every non-empty line is a complete
/// JSON chunk with an inline `done` flag.
pub(crate) struct NdjsonDecoder;

impl FrameDecoder for NdjsonDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Frame, Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Frame::Skip);
        }

        let chunk: StreamChunk = serde_json::from_str(line)
            .map_err(|e| Error::protocol(format!("malformed stream chunk: {e}")))?;

        let usage = chunk
            .done
            .then(|| usage_from_eval_counts(chunk.prompt_eval_count, chunk.eval_count));

        if chunk.done {
            debug!(model = %chunk.model, eval_count = chunk.eval_count, "stream completed");
        }

        Ok(Frame::Delta(ChatStreamDelta {
            content: chunk.message.content,
            done: chunk.done,
            finish_reason: None,
            usage,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let provider = LocalProvider::new(None, None).unwrap();
        assert_eq!(provider.host, DEFAULT_HOST);
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert!(provider.is_enabled());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider =
            LocalProvider::new(Some("http://10.0.0.5:11434/".to_string()), None).unwrap();
        assert_eq!(provider.host, "http://10.0.0.5:11434");
    }

    #[test]
    fn test_request_omits_empty_options() {
        let provider = LocalProvider::new(None, None).unwrap();
        let request =
            provider.build_request(&[Message::user("Hi")], true, &ChatOptions::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("options").is_none());
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_request_nests_options() {
        let provider = LocalProvider::new(None, None).unwrap();
        let options = ChatOptions {
            temperature: Some(0.2),
            top_k: Some(40),
            max_tokens: Some(128),
            ..Default::default()
        };
        let request = provider.build_request(&[Message::user("Hi")], false, &options);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["top_k"], 40);
        assert_eq!(json["options"]["num_predict"], 128);
    }

    #[test]
    fn test_usage_approximation() {
        let usage = usage_from_eval_counts(10, 20);
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 20);
        assert_eq!(usage.total_tokens, 30);
    }

    #[test]
    fn test_ndjson_decoder_content_frame() {
        let mut decoder = NdjsonDecoder;
        let frame = decoder
            .decode_line(r#"{"message":{"content":"Hi"},"done":false}"#)
            .unwrap();
        match frame {
            Frame::Delta(delta) => {
                assert_eq!(delta.content, "Hi");
                assert!(!delta.done);
                assert!(delta.usage.is_none());
            }
            _ => panic!("expected a delta frame"),
        }
    }

    #[test]
    fn test_ndjson_decoder_terminal_frame() {
        let mut decoder = NdjsonDecoder;
        let frame = decoder
            .decode_line(r#"{"message":{"content":""},"done":true,"prompt_eval_count":3,"eval_count":5}"#)
            .unwrap();
        match frame {
            Frame::Delta(delta) => {
                assert!(delta.done);
                let usage = delta.usage.unwrap();
                assert_eq!(usage.completion_tokens, 5);
                assert_eq!(usage.total_tokens, 8);
            }
            _ => panic!("expected a delta frame"),
        }
    }

    #[test]
    fn test_ndjson_decoder_missing_done_is_malformed() {
        let mut decoder = NdjsonDecoder;
        let result = decoder.decode_line(r#"{"message":{"content":"Hi"}}"#);
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
