use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub knowledge: KnowledgeConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: Option<LlmConfig>,
    pub retrieval: RetrievalConfig,
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    pub max_message_chars: usize,
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeConfig {
    pub path: String,
    /// Poll interval for document changes; 0 disables hot reload.
    pub reload_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

/// LLM configuration for the answer-generation model
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub high_threshold: f32,
    pub medium_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub window: usize,
    pub sweep_interval_secs: u64,
    pub max_resident: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub capacity: usize,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub call_timeout_secs: u64,
}

/// Overrides for the contact path read from the knowledge document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactConfig {
    pub email: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            high_threshold: 0.65,
            medium_threshold: 0.45,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 1800,
            window: 10,
            sweep_interval_secs: 300,
            max_resident: 10_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            capacity: 1000,
            sweep_interval_secs: 600,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 8000,
            call_timeout_secs: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let retrieval = RetrievalConfig::default();
        let session = SessionConfig::default();
        let cache = CacheConfig::default();
        let retry = RetryConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("DOCENT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("DOCENT_PORT", 8000),
                api_keys: env::var("DOCENT_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                max_message_chars: parse_env_or("DOCENT_MAX_MESSAGE_CHARS", 2000),
                log_json: env::var("DOCENT_LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
            knowledge: KnowledgeConfig {
                path: env::var("KNOWLEDGE_BASE_PATH")
                    .unwrap_or_else(|_| "knowledge_base/knowledge_base.json".to_string()),
                reload_interval_secs: parse_env_or("KNOWLEDGE_RELOAD_INTERVAL_SECS", 60),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "all-MiniLM-L6-v2".to_string()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 384),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 64),
                api_key: env_non_empty("EMBEDDING_API_KEY"),
                base_url: env_non_empty("EMBEDDING_BASE_URL"),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT", 30),
            },
            llm: env_non_empty("LLM_MODEL").map(|model| LlmConfig {
                model,
                api_key: env_non_empty("LLM_API_KEY"),
                base_url: env_non_empty("LLM_BASE_URL"),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                temperature: parse_env_or("LLM_TEMPERATURE", 0.3),
                max_tokens: parse_env_or("LLM_MAX_TOKENS", 512),
                system_prompt: env_non_empty("DOCENT_SYSTEM_PROMPT"),
            }),
            retrieval: RetrievalConfig {
                top_k: parse_env_or("RETRIEVAL_TOP_K", retrieval.top_k),
                high_threshold: parse_env_or("CONFIDENCE_HIGH_THRESHOLD", retrieval.high_threshold),
                medium_threshold: parse_env_or(
                    "CONFIDENCE_MEDIUM_THRESHOLD",
                    retrieval.medium_threshold,
                ),
            },
            session: SessionConfig {
                ttl_secs: parse_env_or("SESSION_TTL_SECS", session.ttl_secs),
                window: parse_env_or("SESSION_WINDOW", session.window),
                sweep_interval_secs: parse_env_or(
                    "SESSION_SWEEP_INTERVAL_SECS",
                    session.sweep_interval_secs,
                ),
                max_resident: parse_env_or("SESSION_MAX_RESIDENT", session.max_resident),
            },
            cache: CacheConfig {
                enabled: parse_env_or("CACHE_ENABLED", cache.enabled),
                ttl_secs: parse_env_or("CACHE_TTL_SECS", cache.ttl_secs),
                capacity: parse_env_or("CACHE_CAPACITY", cache.capacity),
                sweep_interval_secs: parse_env_or(
                    "CACHE_SWEEP_INTERVAL_SECS",
                    cache.sweep_interval_secs,
                ),
            },
            retry: RetryConfig {
                max_attempts: parse_env_or("RETRY_MAX_ATTEMPTS", retry.max_attempts),
                initial_delay_ms: parse_env_or("RETRY_INITIAL_DELAY_MS", retry.initial_delay_ms),
                max_delay_ms: parse_env_or("RETRY_MAX_DELAY_MS", retry.max_delay_ms),
                call_timeout_secs: parse_env_or(
                    "EXTERNAL_CALL_TIMEOUT_SECS",
                    retry.call_timeout_secs,
                ),
            },
            contact: ContactConfig {
                email: env_non_empty("CONTACT_EMAIL"),
                website: env_non_empty("CONTACT_WEBSITE"),
                phone: env_non_empty("CONTACT_PHONE"),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known embedding providers that use OpenAI-compatible APIs
const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "local"];

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse a model name into (provider, model) tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to local provider
    ("local", model)
}

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}
