use super::types::{ApiError, CompletionRequest, CompletionResponse, StreamChunk};
use crate::decode::{DeltaStream, Frame, FrameDecoder};
use crate::lines::LineStreamExt;
use crate::provider::{ChatProvider, ChatStream};
use crate::{ChatOptions, ChatResponse, ChatStreamDelta, Error, Message};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

const PROVIDER_NAME: &str = "OpenAI";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat provider backed by the OpenAI chat-completions API.
pub struct OpenAiProvider {
    /// Bounded-timeout client for one-shot exchanges and health probes.
    http: Client,
    /// Client without a total-request timeout; generation time is
    /// open-ended, so streaming calls are bounded by the caller instead.
    streaming_http: Client,
    api_key: String,
    model: String,
    base_url: String,
    enabled: bool,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider. The API key is required; the model
    /// falls back to a default when not configured.
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Result<Self, Error> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    /// Create a provider pointed at a custom base URL, for self-hosted
    /// gateways and tests.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: String,
    ) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("OpenAI API key is required"));
        }

        let model = model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let provider = Self {
            http: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            streaming_http: Client::builder().build()?,
            api_key,
            model,
            base_url,
            enabled: true,
        };

        info!(model = %provider.model, "OpenAI chat client initialized");
        Ok(provider)
    }

    fn check_call_input(&self, messages: &[Message]) -> Result<(), Error> {
        if !self.enabled {
            return Err(Error::invalid_input("OpenAI provider is not enabled"));
        }
        if messages.is_empty() {
            return Err(Error::invalid_input("at least one message is required"));
        }
        Ok(())
    }

    /// Build the request payload, flattening options into top-level fields.
    /// Every explicitly set option is forwarded, including zero values.
    fn build_request(&self, messages: &[Message], stream: bool, options: &ChatOptions) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stop: options.stop.clone(),
        }
    }

    /// Send the request and check the status, extracting the structured
    /// error envelope from non-2xx responses when present.
    async fn send(&self, request: &CompletionRequest) -> Result<reqwest::Response, Error> {
        let client = if request.stream {
            &self.streaming_http
        } else {
            &self.http
        };

        let response = client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(envelope) if !envelope.error.message.is_empty() => {
                    error!(
                        status = status.as_u16(),
                        error_type = envelope.error.r#type.as_deref().unwrap_or(""),
                        message = %envelope.error.message,
                        "OpenAI API error"
                    );
                    envelope.error.message
                }
                _ => {
                    error!(status = status.as_u16(), body = %body, "OpenAI API error");
                    body
                }
            };
            return Err(Error::upstream(PROVIDER_NAME, status.as_u16(), message));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiProvider {
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
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            "completion response received"
        );

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(ChatResponse {
            model: completion.model,
            content,
            usage: completion.usage,
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
        let deltas = DeltaStream::new(response.bytes_stream().lines(), SseDecoder);
        Ok(Box::pin(deltas))
    }

    async fn health(&self) -> Result<(), Error> {
        if !self.enabled {
            return Err(Error::invalid_input("OpenAI provider is not enabled"));
        }

        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                PROVIDER_NAME,
                status.as_u16(),
                "health check failed",
            ));
        }

        debug!("OpenAI health check passed");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Framing rule for the cloud protocol: frames are `data: `-prefixed SSE
/// lines ending with a `[DONE]` sentinel.
pub(crate) struct SseDecoder;

impl FrameDecoder for SseDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Frame, Error> {
        let line = line.trim();
        let Some(payload) = line.strip_prefix("data: ") else {
            // Blank keep-alives, comments, and other SSE fields are not
            // frames under this rule.
            return Ok(Frame::Skip);
        };

        if payload == "[DONE]" {
            debug!("stream completed");
            return Ok(Frame::End);
        }

        let chunk: StreamChunk = serde_json::from_str(payload)
            .map_err(|e| Error::protocol(format!("malformed stream chunk: {e}")))?;

        let mut delta = ChatStreamDelta {
            usage: chunk.usage,
            ..Default::default()
        };
        if let Some(choice) = chunk.choices.into_iter().next() {
            delta.content = choice.delta.content.unwrap_or_default();
            delta.done = choice.finish_reason.as_deref() == Some("stop");
            delta.finish_reason = choice.finish_reason;
        }

        Ok(Frame::Delta(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("test-key", None).unwrap();
        assert!(provider.is_enabled());
        assert_eq!(provider.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let provider = OpenAiProvider::new("", Some("gpt-4o".to_string()));
        assert!(matches!(provider, Err(Error::Config(_))));
    }

    #[test]
    fn test_explicit_model_wins() {
        let provider = OpenAiProvider::new("test-key", Some("gpt-4o".to_string())).unwrap();
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn test_request_building_forwards_explicit_zero() {
        let provider = OpenAiProvider::new("test-key", None).unwrap();
        let options = ChatOptions {
            temperature: Some(0.0),
            max_tokens: Some(100),
            ..Default::default()
        };

        let request = provider.build_request(&[Message::user("Hello")], false, &options);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 100);
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn test_sse_decoder_skips_non_data_lines() {
        let mut decoder = SseDecoder;
        assert!(matches!(decoder.decode_line("").unwrap(), Frame::Skip));
        assert!(matches!(
            decoder.decode_line(": keep-alive").unwrap(),
            Frame::Skip
        ));
        assert!(matches!(
            decoder.decode_line("event: ping").unwrap(),
            Frame::Skip
        ));
    }

    #[test]
    fn test_sse_decoder_content_frame() {
        let mut decoder = SseDecoder;
        let frame = decoder
            .decode_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#)
            .unwrap();
        match frame {
            Frame::Delta(delta) => {
                assert_eq!(delta.content, "Hi");
                assert!(!delta.done);
            }
            _ => panic!("expected a delta frame"),
        }
    }

    #[test]
    fn test_sse_decoder_finish_reason_stop() {
        let mut decoder = SseDecoder;
        let frame = decoder
            .decode_line(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#)
            .unwrap();
        match frame {
            Frame::Delta(delta) => {
                assert!(delta.done);
                assert_eq!(delta.finish_reason.as_deref(), Some("stop"));
            }
            _ => panic!("expected a delta frame"),
        }
    }

    #[test]
    fn test_sse_decoder_done_sentinel() {
        let mut decoder = SseDecoder;
        assert!(matches!(
            decoder.decode_line("data: [DONE]").unwrap(),
            Frame::End
        ));
    }

    #[test]
    fn test_sse_decoder_malformed_payload() {
        let mut decoder = SseDecoder;
        let result = decoder.decode_line("data: {not json");
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
