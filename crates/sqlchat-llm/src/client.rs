use crate::types::ModelChunk;
use async_trait::async_trait;
use futures::Stream;
use sqlchat_core::Turn;
use std::pin::Pin;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ModelChunk>> + Send>>;

/// Transport-level model client. Retry and backoff for network failures
/// live below this trait; the agent loop treats any error here as fatal
/// for the current request.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the turn sequence and wait for the complete response text.
    async fn chat(&self, turns: &[Turn], model: Option<&str>) -> Result<String>;

    /// Send the turn sequence and receive the response as a finite chunk
    /// stream ending when the transport signals completion.
    async fn chat_stream(&self, turns: &[Turn], model: Option<&str>) -> Result<ModelStream>;
}
