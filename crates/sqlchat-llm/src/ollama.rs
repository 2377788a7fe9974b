use crate::client::{LLMError, ModelClient, ModelStream, Result};
use crate::types::ModelChunk;
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use sqlchat_core::Turn;

/// Client for a locally hosted Ollama endpoint.
///
/// Ollama's generate API takes a single prompt string, so the turn sequence
/// is flattened to one `"Role: content"` line per turn before sending.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request_body(&self, turns: &[Turn], model: Option<&str>, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": model.unwrap_or(&self.model),
            "prompt": flatten_turns(turns),
            "top_p": 1,
            "frequency_penalty": 0,
            "presence_penalty": 0,
            "stream": stream,
        })
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        Ok(response)
    }
}

/// Render the turn sequence as `"Role: content"` lines.
pub fn flatten_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", capitalize(&turn.role.to_string()), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn chat(&self, turns: &[Turn], model: Option<&str>) -> Result<String> {
        let body = self.build_request_body(turns, model, false);
        log::debug!("ollama generate request, {} turns flattened", turns.len());

        let response = self.post(&body).await?;
        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }

    async fn chat_stream(&self, turns: &[Turn], model: Option<&str>) -> Result<ModelStream> {
        let body = self.build_request_body(turns, model, true);
        let response = self.post(&body).await?;

        // The streaming generate API emits one JSON object per line.
        let stream = try_stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            'outer: while let Some(piece) = bytes.next().await {
                let piece = piece.map_err(LLMError::Http)?;
                buffer.push_str(&String::from_utf8_lossy(&piece));

                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let chunk: GenerateResponse =
                        serde_json::from_str(line).map_err(LLMError::Json)?;
                    if !chunk.response.is_empty() {
                        yield ModelChunk::Token(chunk.response);
                    }
                    if chunk.done {
                        yield ModelChunk::Done;
                        buffer.clear();
                        break 'outer;
                    }
                }
            }

            // A final object may arrive without a trailing newline.
            let line = buffer.trim();
            if !line.is_empty() {
                let chunk: GenerateResponse =
                    serde_json::from_str(line).map_err(LLMError::Json)?;
                if !chunk.response.is_empty() {
                    yield ModelChunk::Token(chunk.response);
                }
                if chunk.done {
                    yield ModelChunk::Done;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}
