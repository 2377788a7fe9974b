pub mod client;
pub mod ollama;
pub mod openai;
pub mod types;

pub use client::{LLMError, ModelClient, ModelStream, Result};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use types::ModelChunk;
