//! A provider-agnostic chat completion abstraction.
//!
//! This library lets a host application submit role-tagged messages and
//! receive either one aggregated completion or a live stream of deltas,
//! without knowing whether the backing model is a cloud API (OpenAI-style
//! chat-completions protocol) or a locally hosted model server
//! (Ollama-style chat protocol).

pub mod error;
pub mod types;
pub mod provider;
pub mod providers;
pub mod lines;
pub(crate) mod decode;
pub mod factory;

// Re-export core types for easy usage
pub use error::Error;
pub use types::*;
pub use provider::{ChatProvider, ChatStream};
pub use providers::*;
pub use factory::{ProviderConfig, ProviderFactory, ProviderKind};
