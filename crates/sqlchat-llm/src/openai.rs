use crate::client::{LLMError, ModelClient, ModelStream, Result};
use crate::types::ModelChunk;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use sqlchat_core::Turn;

/// Client for the OpenAI chat-completions API and compatible endpoints.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request_body(&self, turns: &[Turn], model: Option<&str>, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": model.unwrap_or(&self.model),
            "messages": turns,
            "stream": stream,
            "top_p": 1,
            "frequency_penalty": 0,
            "presence_penalty": 0,
        })
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
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

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn chat(&self, turns: &[Turn], model: Option<&str>) -> Result<String> {
        let body = self.build_request_body(turns, model, false);
        log::debug!("chat request with {} turns", turns.len());

        let response = self.post(&body).await?;
        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LLMError::Api("response contained no choices".to_string()))
    }

    async fn chat_stream(&self, turns: &[Turn], model: Option<&str>) -> Result<ModelStream> {
        let body = self.build_request_body(turns, model, true);
        log::debug!("streaming chat request with {} turns", turns.len());

        let response = self.post(&body).await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .map(|event| {
                let event = event.map_err(|e| LLMError::Stream(e.to_string()))?;

                if event.data == "[DONE]" {
                    return Ok(ModelChunk::Done);
                }

                let chunk: StreamChunk = serde_json::from_str(&event.data).map_err(LLMError::Json)?;
                let content = chunk
                    .choices
                    .first()
                    .and_then(|choice| choice.delta.content.clone())
                    .unwrap_or_default();
                Ok(ModelChunk::Token(content))
            });

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}
