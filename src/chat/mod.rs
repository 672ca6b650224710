//! Chat responder
//!
//! Answers free-text questions through a hosted LLM. When reference
//! documents are indexed, a grounded answer is attempted first and replaced
//! by a general one (with a disclosure) if it turns out inconclusive.
//! Calls are stateless; there is no conversation memory.

pub mod llm;
pub mod policy;
pub mod prompt;
pub mod retrieval;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub use llm::{ChatError, ChatModel, HostedChatModel};
pub use policy::{is_inconclusive, APOLOGY, FALLBACK_DISCLOSURE};
pub use retrieval::DocumentIndex;

pub struct ChatResponder {
    model: Arc<dyn ChatModel>,
    index: Option<DocumentIndex>,
    top_k: usize,
    deadline: Option<Duration>,
}

impl ChatResponder {
    pub fn new(model: Arc<dyn ChatModel>, index: Option<DocumentIndex>, top_k: usize) -> Self {
        Self {
            model,
            index,
            top_k: top_k.max(1),
            deadline: None,
        }
    }

    /// Bound the whole answer, grounded attempt and fallback together.
    /// When it expires the caller gets [`APOLOGY`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether a reference corpus is available for grounded answers
    pub fn is_grounded(&self) -> bool {
        self.index.is_some()
    }

    /// Answer a question. Never fails; upstream problems become [`APOLOGY`].
    pub async fn answer(&self, question: &str) -> String {
        let Some(deadline) = self.deadline else {
            return self.respond(question).await;
        };
        match tokio::time::timeout(deadline, self.respond(question)).await {
            Ok(answer) => answer,
            Err(_) => {
                error!(deadline_ms = deadline.as_millis() as u64, "chat answer timed out");
                APOLOGY.to_string()
            }
        }
    }

    async fn respond(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return policy::EMPTY_QUESTION_REPLY.to_string();
        }

        let Some(index) = &self.index else {
            debug!("no reference corpus, answering from general knowledge");
            return self.general(question, false).await;
        };

        let context: Vec<&str> = index
            .search(question, self.top_k)
            .into_iter()
            .map(|c| c.text.as_str())
            .collect();
        if context.is_empty() {
            info!("no matching reference material, falling back to general knowledge");
            return self.general(question, true).await;
        }

        match self.model.complete(&prompt::grounded_prompt(&context, question)).await {
            Ok(answer) if !is_inconclusive(&answer) => {
                info!(chunks = context.len(), "grounded answer");
                answer
            }
            Ok(_) => {
                info!("grounded answer inconclusive, falling back to general knowledge");
                self.general(question, true).await
            }
            Err(e) => {
                warn!(error = %e, "grounded attempt failed, falling back to general knowledge");
                self.general(question, true).await
            }
        }
    }

    async fn general(&self, question: &str, disclose: bool) -> String {
        match self.model.complete(&prompt::general_prompt(question)).await {
            Ok(answer) if disclose => policy::disclose(&answer),
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "chat completion failed");
                APOLOGY.to_string()
            }
        }
    }
}
