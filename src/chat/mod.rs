pub mod pipeline;
pub mod prompts;

pub use pipeline::ChatPipeline;
