use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "file".to_string())
            .as_str()
        {
            "file" => StorageBackend::File,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!("Unknown STORAGE_BACKEND: {other}"),
        };
        Ok(AppConfig {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            storage: StorageConfig {
                backend,
                root: std::env::var("STORAGE_ROOT")
                    .unwrap_or_else(|_| "./tickets".to_string())
                    .into(),
            },
            llm: LlmConfig {
                url: std::env::var("LLM_URL")
                    .unwrap_or_else(|_| "http://localhost:8081".to_string()),
                api_key: std::env::var("LLM_KEY").unwrap_or_else(|_| "none".to_string()),
                model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "default".to_string()),
                temperature: std::env::var("LLM_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.7),
                max_tokens: std::env::var("LLM_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            },
        })
    }
}
