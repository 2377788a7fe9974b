//! The retry state machine that turns one question into one answer.
//!
//! Each attempt runs generation, extraction, guard check, and execution in
//! order. Retryable failures become natural-language feedback for the next
//! attempt; transport failures abort the request. A successful cycle leaves
//! two assistant turns on the session: one carrying the generated SQL, one
//! carrying the prose answer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sqlchat_core::sql::{classify, contains_fence, extract_sql, SqlClassification};
use sqlchat_core::{AgentError, AgentEvent, QueryResult, Session, Turn};
use sqlchat_db::QueryExecutor;
use sqlchat_llm::ModelClient;

use crate::config::AgentConfig;
use crate::memory::{BudgetedTurns, ConversationMemory};
use crate::prompt::{build_answer_content, build_question_content, SQL_SYSTEM_PROMPT};
use crate::stream::consume_model_stream;

/// SQL extracted from a model response, with its guard classification and
/// the execution result once the query has run.
#[derive(Debug, Clone)]
pub struct CandidateSql {
    pub text: String,
    pub classification: SqlClassification,
    pub result: Option<QueryResult>,
}

/// What one completed question produced.
#[derive(Debug)]
pub struct QuestionOutcome {
    pub answer: String,
    /// `None` when the model answered without generating a query.
    pub sql: Option<CandidateSql>,
    /// Generation attempts used, including the successful one.
    pub attempts: usize,
}

pub struct RetryAgent {
    client: Arc<dyn ModelClient>,
    executor: Arc<dyn QueryExecutor>,
    memory: ConversationMemory,
    config: AgentConfig,
}

impl RetryAgent {
    pub fn new(
        client: Arc<dyn ModelClient>,
        executor: Arc<dyn QueryExecutor>,
        config: AgentConfig,
    ) -> Self {
        let memory = ConversationMemory::new(
            client.clone(),
            config.model.clone(),
            config.input_token_limit,
            config.compaction_min_turns,
        );
        Self {
            client,
            executor,
            memory,
            config,
        }
    }

    /// Answer `question` against the session, retrying generation with
    /// feedback up to the configured bound.
    pub async fn ask(
        &self,
        session: &mut Session,
        question: &str,
        event_tx: mpsc::Sender<AgentEvent>,
        cancel: CancellationToken,
    ) -> Result<QuestionOutcome, AgentError> {
        session.question = Some(question.to_string());
        if session.turns.is_empty() {
            session.push_turn(Turn::system(SQL_SYSTEM_PROMPT));
        }

        // The committed user turn carries the clean question prompt; feedback
        // only ever lives in the outgoing copy of a retry attempt.
        let question_content = build_question_content(question, &session.schema_text, None);
        let budgeted = self.memory.append_and_budget(question_content, session).await?;
        emit_compaction(&event_tx, &budgeted).await;

        let mut feedback: Option<String> = None;

        for attempt in 1..=self.config.max_retry {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            if let Some(ref reason) = feedback {
                log::warn!("attempt {attempt}/{}: retrying after: {reason}", self.config.max_retry);
                let _ = event_tx
                    .send(AgentEvent::Retrying {
                        attempt,
                        feedback: reason.clone(),
                    })
                    .await;
                tokio::time::sleep(self.config.retry_delay).await;
            }

            let outgoing = outgoing_turns(&session.turns, feedback.as_deref());
            let response = self
                .client
                .chat(&outgoing, Some(&self.config.model))
                .await
                .map_err(|e| AgentError::Transport(e.to_string()))?;

            let candidate = match self.evaluate(&response, &event_tx).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => {
                    // The model judged the question answerable without a
                    // query; its text is the answer.
                    session.push_turn(Turn::assistant(response.clone()));
                    session.complete_exchange();
                    let _ = event_tx
                        .send(AgentEvent::Complete {
                            answer: response.clone(),
                        })
                        .await;
                    return Ok(QuestionOutcome {
                        answer: response,
                        sql: None,
                        attempts: attempt,
                    });
                }
                Err(error) if error.is_retryable() => {
                    feedback = Some(retry_feedback(&error));
                    continue;
                }
                Err(error) => return Err(error),
            };

            // Generation accepted: commit the assistant turn carrying the SQL.
            session.push_turn(Turn::assistant(response));

            let result = candidate.result.as_ref().cloned().unwrap_or_default();
            let answer = self
                .answer(session, question, &candidate.text, &result, &event_tx, &cancel)
                .await?;
            session.complete_exchange();
            let _ = event_tx
                .send(AgentEvent::Complete {
                    answer: answer.clone(),
                })
                .await;

            return Ok(QuestionOutcome {
                answer,
                sql: Some(candidate),
                attempts: attempt,
            });
        }

        let feedback = feedback.unwrap_or_else(|| "generation never produced a usable query".to_string());
        let _ = event_tx
            .send(AgentEvent::Error {
                message: feedback.clone(),
            })
            .await;
        Err(AgentError::RetriesExhausted {
            attempts: self.config.max_retry,
            feedback,
        })
    }

    /// Run extraction, the guard check, and execution over one model
    /// response. `Ok(None)` means the response is a fenceless prose answer;
    /// retryable errors become feedback for the next attempt.
    async fn evaluate(
        &self,
        response: &str,
        event_tx: &mpsc::Sender<AgentEvent>,
    ) -> Result<Option<CandidateSql>, AgentError> {
        let sql = match extract_sql(response) {
            Ok(sql) => sql,
            Err(_) if !contains_fence(response) => return Ok(None),
            Err(error) => return Err(error),
        };

        let _ = event_tx.send(AgentEvent::SqlExtracted { sql: sql.clone() }).await;

        let classification = classify(&sql);
        if let SqlClassification::Mutating(keyword) = classification {
            return Err(AgentError::MutatingStatement(keyword.to_string()));
        }

        let result = self
            .executor
            .execute(&sql)
            .map_err(|e| AgentError::Execution(e.to_string()))?;
        let _ = event_tx
            .send(AgentEvent::QueryExecuted {
                row_count: result.rows.len(),
            })
            .await;

        Ok(Some(CandidateSql {
            text: sql,
            classification,
            result: Some(result),
        }))
    }

    /// Answering state: build the answer prompt from the executed result,
    /// thread it through the memory budget, and commit the model's reply.
    async fn answer(
        &self,
        session: &mut Session,
        question: &str,
        sql: &str,
        result: &QueryResult,
        event_tx: &mpsc::Sender<AgentEvent>,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let content = build_answer_content(question, sql, result, self.config.result_row_limit);
        let budgeted = self.memory.append_and_budget(content, session).await?;
        emit_compaction(event_tx, &budgeted).await;

        let answer = if self.config.stream_answer {
            let stream = self
                .client
                .chat_stream(&session.turns, Some(&self.config.model))
                .await
                .map_err(|e| AgentError::Transport(e.to_string()))?;
            consume_model_stream(stream, event_tx, cancel).await?
        } else {
            self.client
                .chat(&session.turns, Some(&self.config.model))
                .await
                .map_err(|e| AgentError::Transport(e.to_string()))?
        };

        session.push_turn(Turn::assistant(answer.clone()));
        Ok(answer)
    }
}

async fn emit_compaction(event_tx: &mpsc::Sender<AgentEvent>, budgeted: &BudgetedTurns) {
    if let Some(turns_summarized) = budgeted.compacted {
        let _ = event_tx
            .send(AgentEvent::ContextSummarized { turns_summarized })
            .await;
    }
}

/// Natural-language feedback the next generation attempt carries for a
/// retryable failure.
fn retry_feedback(error: &AgentError) -> String {
    match error {
        AgentError::NoSqlBlock => {
            "SQL query not enclosed in proper sql-fenced code block".to_string()
        }
        AgentError::MutatingStatement(keyword) => format!(
            "Generated SQL contains the data-mutating keyword `{keyword}`; \
only read (SELECT) queries are permitted."
        ),
        AgentError::Execution(message) => format!("Generation failed for error: {message}"),
        other => other.to_string(),
    }
}

/// The turn sequence actually sent for one attempt. Feedback from the
/// previous failure is appended to the last user turn of the copy only;
/// the committed history keeps the clean question.
fn outgoing_turns(turns: &[Turn], feedback: Option<&str>) -> Vec<Turn> {
    let mut outgoing = turns.to_vec();
    if let Some(feedback) = feedback {
        if let Some(last) = outgoing.last_mut() {
            *last = Turn::user(format!(
                "{}\n\nThe previous attempt failed. {} Correct the problem and answer again.",
                last.content, feedback
            ));
        }
    }
    outgoing
}
