use std::env;

/// Connection settings for the identity/storage collaborator (GoTrue auth,
/// PostgREST tables, object storage behind one base URL).
#[derive(Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub anon_key: String,
}

/// Connection settings for the LLM collaborator (OpenAI-compatible
/// chat-completions endpoint).
#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

pub struct Config {
    pub storage: Option<StorageConfig>,
    pub llm: Option<LlmConfig>,
}

pub const DEFAULT_LLM_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "deepseek-chat";

impl Config {
    pub fn from_env() -> Self {
        let storage = match (env::var("STORAGE_URL").ok(), env::var("STORAGE_ANON_KEY").ok()) {
            (Some(base_url), Some(anon_key)) => Some(StorageConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            _ => {
                tracing::warn!(
                    "STORAGE_URL / STORAGE_ANON_KEY not set — journal storage unavailable"
                );
                None
            }
        };

        let llm = match env::var("LLM_API_KEY").ok() {
            Some(api_key) => Some(LlmConfig {
                base_url: env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_LLM_URL.to_string()),
                api_key,
                model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            }),
            None => {
                tracing::warn!("LLM_API_KEY not set — analysis and coaching unavailable");
                None
            }
        };

        if storage.is_none() && llm.is_none() {
            tracing::error!("no collaborators configured — all tools will fail");
        }

        Config { storage, llm }
    }
}
