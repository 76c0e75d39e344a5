pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{ChatSettings, IndexingSettings, LlmSettings, ServerSettings, Settings};
