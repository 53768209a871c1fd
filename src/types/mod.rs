//! Shared domain vocabulary used by every provider.

pub mod message;
pub mod options;
pub mod response;
pub mod streaming;

pub use message::{Message, Role};
pub use options::ChatOptions;
pub use response::{ChatResponse, Usage};
pub use streaming::ChatStreamDelta;
