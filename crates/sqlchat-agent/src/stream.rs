//! Streamed answer consumption.
//!
//! Chunks are forwarded as events in arrival order. If the caller cancels
//! partway, consumption stops with [`AgentError::Cancelled`] and the caller
//! must not commit the partial text as an assistant turn.

use futures::StreamExt;
use sqlchat_core::{AgentError, AgentEvent};
use sqlchat_llm::{ModelChunk, ModelStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub async fn consume_model_stream(
    mut stream: ModelStream,
    event_tx: &mpsc::Sender<AgentEvent>,
    cancel: &CancellationToken,
) -> Result<String, AgentError> {
    let mut content = String::new();

    while let Some(chunk) = stream.next().await {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        match chunk {
            Ok(ModelChunk::Token(token)) => {
                content.push_str(&token);
                let _ = event_tx.send(AgentEvent::Token { content: token }).await;
            }
            Ok(ModelChunk::Done) => {
                log::debug!("model stream completed");
            }
            Err(error) => {
                let message = format!("stream error: {error}");
                let _ = event_tx
                    .send(AgentEvent::Error {
                        message: message.clone(),
                    })
                    .await;
                return Err(AgentError::Transport(message));
            }
        }
    }

    Ok(content)
}
