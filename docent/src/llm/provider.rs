use async_trait::async_trait;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{DocentError, Result};
use crate::llm::api::LlmApiClient;
use crate::traits::{GenerationRequest, Generator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

/// Answer generator backed by one configured chat-completions provider.
///
/// When no model is configured the provider stays constructible but every
/// call fails with `LlmUnavailable`, which the chat service degrades to a
/// fallback reply.
#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    client: Option<LlmApiClient>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        if let LlmBackend::Unavailable { reason } = &backend {
            tracing::warn!(reason = %reason, "LLM provider unavailable");
            return Self {
                backend,
                client: None,
            };
        }

        match LlmApiClient::new(config) {
            Ok(client) => {
                tracing::info!(backend = ?backend, model = client.model(), "LLM provider ready");
                Self {
                    backend,
                    client: Some(client),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to initialise LLM client");
                Self::unavailable(&e.to_string())
            }
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client not initialised".to_string(),
        }
    }
}

#[async_trait]
impl Generator for LlmProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match &self.client {
            Some(client) => client.generate(request).await,
            None => Err(DocentError::LlmUnavailable(self.unavailable_reason())),
        }
    }
}
