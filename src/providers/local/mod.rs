//! Local provider speaking the Ollama chat protocol
//! (NDJSON streaming, no credential).

mod client;
pub mod types;

pub use client::LocalProvider;
