use thiserror::Error;

/// Errors that can occur when using the chat-providers library.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid settings at construction time. Fatal to
    /// construction and never retried.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Rejected before any network activity (e.g. an empty message list).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Connection, DNS, or timeout failure from the HTTP layer.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status from the backing provider. When the provider returns
    /// a structured error envelope, `message` holds its extracted message;
    /// otherwise it holds the raw response body.
    #[error("{provider} API error (status {status}): {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Malformed frame or JSON while decoding a response. Aborts the
    /// stream it occurred on.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol(message.into())
    }

    pub fn upstream(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            provider,
            status,
            message: message.into(),
        }
    }
}
