//! Provider implementations for the supported backing services.

pub mod local;
pub mod openai;

// Re-export commonly used provider types
pub use local::LocalProvider;
pub use openai::OpenAiProvider;
