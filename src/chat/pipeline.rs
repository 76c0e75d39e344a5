use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::history::HistoryStore;
use crate::llm::LlmProvider;
use crate::vector::IndexManager;

use super::prompts;

/// Question answering over one document's conversation: loads the recent
/// history window, resolves the document's index, reformulates follow-up
/// questions into standalone queries, and generates a grounded answer.
///
/// Persisting messages is the caller's concern; this type writes nothing.
#[derive(Clone)]
pub struct ChatPipeline {
    history: HistoryStore,
    index: IndexManager,
    llm: Arc<dyn LlmProvider>,
    history_window: i64,
    top_k: usize,
}

impl ChatPipeline {
    pub fn new(
        history: HistoryStore,
        index: IndexManager,
        llm: Arc<dyn LlmProvider>,
        history_window: i64,
        top_k: usize,
    ) -> Self {
        Self {
            history,
            index,
            llm,
            history_window,
            top_k,
        }
    }

    pub async fn answer_question(
        &self,
        user_id: &str,
        document_id: &str,
        question: &str,
    ) -> Result<String, PipelineError> {
        let history = self
            .history
            .load(user_id, document_id, self.history_window)
            .await?;
        let index = self.index.resolve(user_id, document_id).await?;

        // First question in a conversation searches with the raw text.
        let search_query = if history.is_empty() {
            question.to_string()
        } else {
            let reformulated = self
                .llm
                .complete(&prompts::build_reformulation_messages(&history, question))
                .await
                .map_err(PipelineError::generation)?;
            let reformulated = reformulated.trim();
            if reformulated.is_empty() {
                question.to_string()
            } else {
                reformulated.to_string()
            }
        };
        tracing::debug!(
            "Search query for document {}: {}",
            document_id,
            search_query
        );

        let results = index.similarity_search(&search_query, self.top_k).await?;
        if results.is_empty() {
            tracing::debug!("No chunks retrieved for document {}", document_id);
        }
        let context = prompts::format_context(&results);

        let answer = self
            .llm
            .complete(&prompts::build_answer_messages(&context, &history, question))
            .await
            .map_err(PipelineError::generation)?;

        tracing::info!(
            "Answered question for document {} using {} chunks",
            document_id,
            results.len()
        );
        Ok(answer)
    }
}
