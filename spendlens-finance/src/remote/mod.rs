//! Classification through a hosted language model.

pub mod batch;
pub mod client;
pub mod json_recovery;
pub mod prompt;

pub use batch::{RemoteClassifier, RemoteSettings, DEFAULT_BATCH_SIZE};
pub use client::{
    AnthropicClient, CompletionClient, CompletionParams, LlmConfig, LlmError, DEFAULT_API_KEY_ENV,
    DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use json_recovery::{extract_json_candidate, parse_json_object};
