use crate::{ChatOptions, ChatResponse, ChatStreamDelta, Error, Message};
use futures_util::Stream;
use std::pin::Pin;

/// A live sequence of completion deltas.
///
/// The stream is lazy and driven entirely by the caller's task — nothing is
/// spawned on its behalf. It ends after the first delta with `done = true`
/// or the provider's end-of-stream sentinel. Dropping it mid-flight is the
/// early-stop signal: no further frames are read and the underlying response
/// body is released.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatStreamDelta, Error>> + Send>>;

/// The capability contract every chat provider exposes, regardless of the
/// backing service.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a one-shot completion request and return the fully aggregated
    /// response.
    ///
    /// Fails with [`Error::InvalidInput`] before any network activity if
    /// `messages` is empty or the provider is disabled.
    async fn completion(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, Error>;

    /// Send a streaming completion request and return the delta stream.
    ///
    /// Input validation is identical to [`ChatProvider::completion`]. A
    /// malformed frame surfaces as [`Error::Protocol`] and fuses the stream;
    /// a read failure surfaces as [`Error::Transport`].
    async fn completion_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatStream, Error>;

    /// Lightweight reachability probe against the backing service. Advisory
    /// only; it never sends a completion request and does not gate the
    /// completion calls.
    async fn health(&self) -> Result<(), Error>;

    /// True once the provider was constructed successfully. A provider is
    /// never partially enabled.
    fn is_enabled(&self) -> bool;

    /// The effective model name: the configured value, or the provider's
    /// default if none was supplied.
    fn model(&self) -> &str;
}
