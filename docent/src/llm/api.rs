use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{DocentError, Result},
    llm::prompts,
    models::Role,
    traits::GenerationRequest,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    temperature: f32,
    max_tokens: u32,
}

/// Chat-completions client for OpenAI-compatible providers.
///
/// Makes one request per call. Transient failures come back as retryable
/// errors for the caller's retry policy.
#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(DocentError::LlmUnavailable(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                DocentError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 429/5xx internally with its own backoff; cap it
        // at the request timeout so a call never outlives the caller's budget.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.message.trim().is_empty() {
            return Err(DocentError::Validation("Message cannot be empty".to_string()));
        }

        let chat_request = self.build_request(request)?;
        match self.client.chat().create(chat_request).await {
            Ok(response) => Self::extract_content(response),
            Err(error) => {
                if let Some(rate_limit_error) = Self::rate_limit_error(&error) {
                    return Err(rate_limit_error);
                }
                if let Some(auth_error) = Self::auth_error(&error) {
                    return Err(auth_error);
                }
                let retryable = Self::is_retryable(&error);
                Err(Self::map_openai_error(error, retryable))
            }
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.history.len() + 2);

        if !request.system_instruction.trim().is_empty() {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(request.system_instruction.as_str())
                    .build()
                    .map_err(|error| {
                        DocentError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        for turn in &request.history {
            let message: ChatCompletionRequestMessage = match turn.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.as_str())
                    .build()
                    .map(Into::into),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.as_str())
                    .build()
                    .map(Into::into),
            }
            .map_err(|error| DocentError::Validation(format!("Invalid history turn: {error}")))?;
            messages.push(message);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompts::answer_prompt(&request.context, &request.message))
                .build()
                .map_err(|error| DocentError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        );

        CreateChatCompletionRequestArgs::default()
            .model(self.config.model.clone())
            .messages(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|error| {
                DocentError::Validation(format!("Invalid LLM completion request: {error}"))
            })
    }

    /// Empty content is returned as-is; it is not a transport failure.
    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocentError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        tracing::debug!(response_len = content.len(), "LLM response received");
        Ok(content)
    }

    fn is_retryable(error: &OpenAIError) -> bool {
        match error {
            OpenAIError::ApiError(api_error) => {
                api_error.r#type.is_none() && api_error.code.is_none()
            }
            OpenAIError::Reqwest(reqwest_error) => reqwest_error
                .status()
                .map(|status| status.is_server_error())
                .unwrap_or(true),
            _ => false,
        }
    }

    fn rate_limit_error(error: &OpenAIError) -> Option<DocentError> {
        match error {
            OpenAIError::Reqwest(reqwest_error)
                if reqwest_error.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) =>
            {
                Some(DocentError::ApiRateLimit { retry_after: None })
            }
            OpenAIError::ApiError(api_error) if Self::is_rate_limit_api_error(api_error) => {
                Some(DocentError::ApiRateLimit { retry_after: None })
            }
            _ => None,
        }
    }

    fn auth_error(error: &OpenAIError) -> Option<DocentError> {
        match error {
            OpenAIError::Reqwest(reqwest_error)
                if reqwest_error.status() == Some(reqwest::StatusCode::UNAUTHORIZED)
                    || reqwest_error.status() == Some(reqwest::StatusCode::FORBIDDEN) =>
            {
                Some(DocentError::ApiAuth(format!(
                    "LLM authentication failed: {reqwest_error}"
                )))
            }
            OpenAIError::ApiError(api_error) if Self::is_auth_api_error(api_error) => Some(
                DocentError::ApiAuth(format!("LLM authentication failed: {api_error}")),
            ),
            _ => None,
        }
    }

    fn is_rate_limit_api_error(api_error: &ApiError) -> bool {
        let message = api_error.message.to_lowercase();
        let error_type = api_error.r#type.clone().unwrap_or_default().to_lowercase();
        let code = api_error.code.clone().unwrap_or_default().to_lowercase();

        message.contains("rate limit")
            || message.contains("too many requests")
            || error_type.contains("rate_limit")
            || code.contains("rate_limit")
            || code == "insufficient_quota"
    }

    fn is_auth_api_error(api_error: &ApiError) -> bool {
        let message = api_error.message.to_lowercase();
        let error_type = api_error.r#type.clone().unwrap_or_default().to_lowercase();
        let code = api_error.code.clone().unwrap_or_default().to_lowercase();

        message.contains("unauthorized")
            || message.contains("forbidden")
            || message.contains("authentication")
            || message.contains("invalid api key")
            || code.contains("invalid_api_key")
            || code.contains("authentication")
            || error_type.contains("authentication")
    }

    fn map_openai_error(error: OpenAIError, retryable: bool) -> DocentError {
        match error {
            OpenAIError::Reqwest(reqwest_error) if reqwest_error.is_timeout() => {
                DocentError::Llm(format!("LLM request timed out: {reqwest_error}"))
            }
            OpenAIError::Reqwest(reqwest_error) => {
                DocentError::Llm(format!("LLM request failed: {reqwest_error}"))
            }
            OpenAIError::ApiError(api_error) if retryable => {
                DocentError::Llm(format!("LLM API error: {api_error}"))
            }
            OpenAIError::ApiError(api_error) => {
                DocentError::InvalidArgument(format!("LLM rejected the request: {api_error}"))
            }
            OpenAIError::JSONDeserialize(err) => {
                DocentError::Llm(format!("Failed to parse LLM response: {err}"))
            }
            OpenAIError::InvalidArgument(message) => DocentError::Validation(message),
            other => DocentError::Llm(other.to_string()),
        }
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_BASE_URL,
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => "http://localhost:1234/v1",
        _ => OPENAI_BASE_URL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Turn;
    use chrono::Utc;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_llm_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            model: "ollama/llama3".to_string(),
            api_key: None,
            base_url: Some(base_url.to_string()),
            timeout_secs: 1,
            temperature: 0.3,
            max_tokens: 256,
            system_prompt: None,
        }
    }

    fn completion_body(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "llama3",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            system_instruction: "You are a helpful AI assistant for Acme.".to_string(),
            context: vec!["RPO fees are 15% lower than market average.".to_string()],
            history: vec![
                Turn::user("What is RPO?", Utc::now()),
                Turn::assistant("Recruitment Process Outsourcing.", Utc::now()),
            ],
            message: "How much does it cost?".to_string(),
        }
    }

    #[test]
    fn test_request_carries_history_in_order() {
        let client = LlmApiClient::new(&test_llm_config("http://localhost:1")).unwrap();
        let built = client.build_request(&request()).unwrap();
        let value = serde_json::to_value(&built).unwrap();
        let messages = value["messages"].as_array().unwrap();

        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[1]["content"], "What is RPO?");
        let last = messages[3]["content"].as_str().unwrap();
        assert!(last.contains("[Context 1]: RPO fees are 15% lower than market average."));
        assert!(last.contains("User question: How much does it cost?"));
        assert_eq!(value["model"], "llama3");
        assert_eq!(value["max_tokens"], 256);
    }

    #[test]
    fn test_remote_provider_requires_api_key() {
        let mut config = test_llm_config("http://localhost:1");
        config.model = "openai/gpt-4o-mini".to_string();
        assert!(matches!(
            LlmApiClient::new(&config),
            Err(DocentError::LlmUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("RPO fees are 15% lower.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmApiClient::new(&test_llm_config(&server.uri())).unwrap();
        let answer = client.generate(&request()).await.unwrap();
        assert_eq!(answer, "RPO fees are 15% lower.");
    }

    #[tokio::test]
    async fn test_empty_content_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("")))
            .mount(&server)
            .await;

        let client = LlmApiClient::new(&test_llm_config(&server.uri())).unwrap();
        assert_eq!(client.generate(&request()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_invalid_key_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key"
                }
            })))
            .mount(&server)
            .await;

        let client = LlmApiClient::new(&test_llm_config(&server.uri())).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, DocentError::ApiAuth(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("x")))
            .expect(0)
            .mount(&server)
            .await;

        let client = LlmApiClient::new(&test_llm_config(&server.uri())).unwrap();
        let mut req = request();
        req.message = "   ".to_string();
        assert!(matches!(
            client.generate(&req).await,
            Err(DocentError::Validation(_))
        ));
    }
}
