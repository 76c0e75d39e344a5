use crate::history::{ChatRole, StoredMessage};
use crate::llm::ChatMessage;
use crate::vector::ChunkSearchResult;

/// Instruction appended after the conversation when turning a follow-up
/// question into a standalone search query.
pub const REFORMULATION_INSTRUCTION: &str = "Given the above conversation, generate a search \
     query to look up in order to get information relevant to the conversation";

const ANSWER_SYSTEM_PREFIX: &str = "Answer the user's questions based on the below context:\n\n";

fn history_to_messages(history: &[StoredMessage]) -> Vec<ChatMessage> {
    let mut out = Vec::new();
    for msg in history {
        if msg.content.trim().is_empty() {
            continue;
        }
        let message = match msg.role {
            ChatRole::Ai => ChatMessage::assistant(msg.content.clone()),
            ChatRole::Human => ChatMessage::user(msg.content.clone()),
        };
        out.push(message);
    }
    out
}

/// Builds the reformulation exchange: prior conversation, the new
/// question, then the instruction to produce a standalone query.
pub fn build_reformulation_messages(
    history: &[StoredMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = history_to_messages(history);
    messages.push(ChatMessage::user(question));
    messages.push(ChatMessage::user(REFORMULATION_INSTRUCTION));
    messages
}

/// Builds the grounded answer exchange: a system prompt carrying the
/// retrieved context, the prior conversation, then the question itself.
pub fn build_answer_messages(
    context: &str,
    history: &[StoredMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "{ANSWER_SYSTEM_PREFIX}{context}"
    ))];
    messages.extend(history_to_messages(history));
    messages.push(ChatMessage::user(question));
    messages
}

/// Joins retrieved chunks into the context block for the system prompt.
pub fn format_context(results: &[ChunkSearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
