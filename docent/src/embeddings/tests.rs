//! Tests for the HTTP embeddings backend.
//!
//! Tests cover:
//! 1. Successful responses, single and multiple inputs
//! 2. Request format matches the OpenAI embeddings API
//! 3. Authorization header handling
//! 4. Error classification (429, 5xx, 401/403, other 4xx), single attempt each
//! 5. Provider batching and dimension checks through the `Embedder` trait

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::config::parse_provider_model;
use crate::embeddings::{default_base_url, ApiConfig, EmbeddingApiClient, EmbeddingProvider};
use crate::error::DocentError;
use crate::traits::Embedder;

fn test_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-api-key".to_string()),
        model: "text-embedding-3-small".to_string(),
        timeout_secs: 10,
    }
}

fn embedding_response(embeddings: Vec<Vec<f32>>) -> serde_json::Value {
    json!({
        "data": embeddings.into_iter().map(|e| json!({ "embedding": e })).collect::<Vec<_>>()
    })
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_api_client_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.1, 0.2, 0.3]])),
        )
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let embeddings = client.embed(&["test text"]).await.unwrap();

    assert_eq!(embeddings, vec![vec![0.1, 0.2, 0.3]]);
}

#[tokio::test]
async fn test_api_client_multiple_inputs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_response(vec![
            vec![0.1, 0.2],
            vec![0.3, 0.4],
        ])))
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let embeddings = client.embed(&["first", "second"]).await.unwrap();

    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[1], vec![0.3, 0.4]);
}

#[tokio::test]
async fn test_api_client_trailing_slash_in_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![1.0]])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        EmbeddingApiClient::new(test_config(&format!("{}/", mock_server.uri()))).unwrap();
    assert!(client.embed(&["x"]).await.is_ok());
}

// =============================================================================
// Request format
// =============================================================================

#[tokio::test]
async fn test_api_client_request_format() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_json(json!({
            "model": "text-embedding-3-small",
            "input": ["What is RPO?"]
        })))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.5]])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    client.embed(&["What is RPO?"]).await.unwrap();
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_api_client_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.5]])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    assert!(client.embed(&["test"]).await.is_ok());
}

#[tokio::test]
async fn test_api_client_no_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(|req: &Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.5]]))
            }
        })
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.api_key = None;
    let client = EmbeddingApiClient::new(config).unwrap();
    assert!(client.embed(&["test"]).await.is_ok());
}

// =============================================================================
// Error classification
// =============================================================================

#[tokio::test]
async fn test_api_client_rate_limit_is_surfaced_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let err = client.embed(&["test"]).await.unwrap_err();

    assert!(matches!(err, DocentError::ApiRateLimit { retry_after: Some(7) }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_api_client_server_error_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let err = client.embed(&["test"]).await.unwrap_err();

    assert!(matches!(err, DocentError::Embedding(ref msg) if msg.contains("503")));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_api_client_auth_error_is_not_retryable() {
    for status in [401, 403] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(status).set_body_string("invalid key"))
            .mount(&mock_server)
            .await;

        let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
        let err = client.embed(&["test"]).await.unwrap_err();

        assert!(matches!(err, DocentError::ApiAuth(ref body) if body == "invalid key"));
        assert!(!err.is_retryable());
    }
}

#[tokio::test]
async fn test_api_client_bad_request_is_not_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("input too long"))
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let err = client.embed(&["test"]).await.unwrap_err();
    assert!(matches!(err, DocentError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_api_client_malformed_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let err = client.embed(&["test"]).await.unwrap_err();
    assert!(matches!(err, DocentError::Embedding(ref msg) if msg.contains("parse")));
}

// =============================================================================
// Provider
// =============================================================================

#[tokio::test]
async fn test_provider_batches_passages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
            let count = body["input"].as_array().map(Vec::len).unwrap_or(0);
            ResponseTemplate::new(200)
                .set_body_json(embedding_response(vec![vec![1.0, 0.0]; count]))
        })
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let provider = EmbeddingProvider::from_api_client(client, 2, 2);

    let passages = (0..5).map(|i| format!("chunk {i}")).collect();
    let embeddings = provider.embed_passages(passages).await.unwrap();
    assert_eq!(embeddings.len(), 5);
    assert_eq!(provider.dimensions(), 2);
}

#[tokio::test]
async fn test_provider_rejects_short_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_response(vec![])))
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let provider = EmbeddingProvider::from_api_client(client, 2, 8);

    let err = provider.embed_query("What is RPO?").await.unwrap_err();
    assert!(matches!(err, DocentError::Embedding(_)));
}

#[tokio::test]
async fn test_provider_rejects_unexpected_dimensions_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(embedding_response(vec![vec![0.1, 0.2, 0.3]])),
        )
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let provider = EmbeddingProvider::from_api_client(client, 2, 8);

    let err = provider.embed_query("What is RPO?").await.unwrap_err();
    assert!(matches!(err, DocentError::InvalidArgument(_)));
    assert!(err.to_string().contains("3 dimensions"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_provider_empty_input_skips_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = EmbeddingApiClient::new(test_config(&mock_server.uri())).unwrap();
    let provider = EmbeddingProvider::from_api_client(client, 2, 8);
    assert!(provider.embed_passages(Vec::new()).await.unwrap().is_empty());
}

#[test]
fn test_parse_provider_selects_backend() {
    assert_eq!(parse_provider_model("all-MiniLM-L6-v2"), ("local", "all-MiniLM-L6-v2"));
    assert_eq!(
        parse_provider_model("openrouter/openai/text-embedding-3-small"),
        ("openrouter", "openai/text-embedding-3-small")
    );
    assert_eq!(parse_provider_model("OpenAI/x"), ("OpenAI", "x"));
    assert_eq!(default_base_url("ollama"), "http://localhost:11434/v1");
}
