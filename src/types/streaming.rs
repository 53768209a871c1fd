//! Types for streaming responses.

use crate::types::Usage;

/// One incremental fragment of a streamed completion.
///
/// A stream is a sequence of deltas terminated exactly once by a delta with
/// `done = true` (or by the cloud end sentinel, which carries no delta).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatStreamDelta {
    /// Content fragment; may be empty on the terminal delta.
    pub content: String,
    /// True on the terminal delta of the stream.
    pub done: bool,
    /// The provider's finish reason, when it reports one (e.g. "stop").
    pub finish_reason: Option<String>,
    /// Usage statistics, populated on the terminal delta when the protocol
    /// reports them (the local protocol always does; the cloud protocol
    /// only when asked to).
    pub usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_delta() {
        let delta = ChatStreamDelta {
            done: true,
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        };
        assert!(delta.done);
        assert!(delta.content.is_empty());
    }
}
