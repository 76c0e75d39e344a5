pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider};
pub use types::ChatMessage;
