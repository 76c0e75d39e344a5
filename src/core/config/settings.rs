use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use super::paths::AppPaths;

/// Typed application settings loaded from `config.yml`. Every field has a
/// default so a missing or partial file still yields a working instance;
/// components receive the relevant section at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub indexing: IndexingSettings,
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Port to bind; 0 picks an ephemeral port. The PORT environment
    /// variable takes precedence.
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Upper bound for uploaded document bytes.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible endpoint, without the `/v1` suffix.
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Number of recent messages fed to reformulation and answering.
    pub history_window: i64,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Per-conversation cap on asked questions. Disabled when unset.
    pub question_limit: Option<i64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 0,
            allowed_origins: Vec::new(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: None,
            max_tokens: None,
            request_timeout_secs: 120,
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_window: 6,
            top_k: 4,
            question_limit: None,
        }
    }
}

impl LlmSettings {
    /// The configured key, falling back to the usual environment variables.
    pub fn resolved_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                return Some(key.clone());
            }
        }
        for var in ["DOCCHAT_API_KEY", "OPENAI_API_KEY"] {
            if let Ok(key) = env::var(var) {
                if !key.trim().is_empty() {
                    return Some(key);
                }
            }
        }
        None
    }
}

impl Settings {
    pub fn load(paths: &AppPaths) -> anyhow::Result<Self> {
        let path = config_path(paths);
        if !path.exists() {
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.indexing.chunk_size == 0 {
            bail!("indexing.chunk_size must be at least 1");
        }
        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            bail!("indexing.chunk_overlap must be smaller than indexing.chunk_size");
        }
        if self.chat.top_k == 0 {
            bail!("chat.top_k must be at least 1");
        }
        if self.chat.history_window < 0 {
            bail!("chat.history_window must not be negative");
        }
        if let Some(limit) = self.chat.question_limit {
            if limit < 1 {
                bail!("chat.question_limit must be at least 1 when set");
            }
        }
        if self.llm.request_timeout_secs == 0 {
            bail!("llm.request_timeout_secs must be at least 1");
        }
        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be at least 1");
        }
        Ok(())
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("DOCCHAT_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return user_config;
    }

    paths.project_root.join("config.yml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 0);
        assert_eq!(settings.indexing.chunk_size, 1000);
        assert_eq!(settings.indexing.chunk_overlap, 200);
        assert_eq!(settings.chat.top_k, 4);
        assert_eq!(settings.chat.history_window, 6);
        assert_eq!(settings.chat.question_limit, None);
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let yaml = "llm:\n  chat_model: local-chat\nchat:\n  top_k: 2\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(settings.llm.chat_model, "local-chat");
        assert_eq!(settings.llm.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.chat.top_k, 2);
        assert_eq!(settings.chat.history_window, 6);
        assert_eq!(settings.indexing.chunk_size, 1000);
    }

    #[test]
    fn validate_rejects_overlap_not_smaller_than_chunk_size() {
        let mut settings = Settings::default();
        settings.indexing.chunk_size = 100;
        settings.indexing.chunk_overlap = 100;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_top_k() {
        let mut settings = Settings::default();
        settings.chat.top_k = 0;
        assert!(settings.validate().is_err());
    }
}
