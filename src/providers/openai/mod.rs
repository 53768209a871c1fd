//! Cloud provider speaking the OpenAI chat-completions protocol
//! (SSE-framed streaming, bearer-credential auth).

mod client;
pub mod types;

pub use client::OpenAiProvider;
