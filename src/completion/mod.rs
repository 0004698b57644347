//! Building completion requests and sending them.

pub mod capability;
pub mod client;
pub mod language;
pub mod payload;
pub mod prompt;

pub use capability::{ModelCapabilities, SamplingParam};
pub use client::{CompletionClient, DEFAULT_BASE_URL};
pub use payload::{build_payload, SamplingConfig};
pub use prompt::{normalize_input, reply_messages, summary_messages, SummaryStyle};
