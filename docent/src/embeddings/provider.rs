use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};

use crate::config::{parse_provider_model, EmbeddingsConfig};
use crate::error::{DocentError, Result};
use crate::traits::Embedder;

use super::api::{default_base_url, ApiConfig, EmbeddingApiClient};

#[derive(Clone)]
enum EmbeddingBackend {
    Local {
        model: Arc<Mutex<TextEmbedding>>,
    },
    Api {
        client: EmbeddingApiClient,
    },
}

/// Embeds queries and knowledge chunks with either a local fastembed model or
/// an OpenAI-compatible `/embeddings` endpoint, chosen by the model prefix.
#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    dimensions: usize,
    batch_size: usize,
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model_name) = parse_provider_model(&config.model);
        let batch_size = config.batch_size.max(1);

        let backend = if provider.eq_ignore_ascii_case("local") {
            let model = build_model(resolve_embedding_model(model_name))?;
            EmbeddingBackend::Local {
                model: Arc::new(Mutex::new(model)),
            }
        } else {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url(provider).to_string());
            let client = EmbeddingApiClient::new(ApiConfig {
                base_url,
                api_key: config.api_key.clone(),
                model: model_name.to_string(),
                timeout_secs: config.timeout_secs,
            })?;
            EmbeddingBackend::Api { client }
        };

        tracing::info!(provider, model = model_name, "Embedding provider ready");
        Ok(Self {
            backend,
            dimensions: config.dimensions,
            batch_size,
        })
    }

    pub fn from_api_client(client: EmbeddingApiClient, dimensions: usize, batch_size: usize) -> Self {
        Self {
            backend: EmbeddingBackend::Api { client },
            dimensions,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let mut embedded = self.embed_batch(batch.to_vec()).await?;
            if embedded.len() != batch.len() {
                return Err(DocentError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            if let Some(vector) = embedded.iter().find(|v| v.len() != self.dimensions) {
                return Err(DocentError::InvalidArgument(format!(
                    "Embedding model returned {} dimensions, EMBEDDING_DIMENSIONS is {}",
                    vector.len(),
                    self.dimensions
                )));
            }
            all.append(&mut embedded);
            tokio::task::yield_now().await;
        }
        Ok(all)
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        match &self.backend {
            EmbeddingBackend::Local { model } => {
                let model = Arc::clone(model);
                let batch_size = self.batch_size;
                tokio::task::spawn_blocking(move || {
                    let mut model = model.lock().map_err(|e| {
                        DocentError::Embedding(format!("Embedding model lock poisoned: {e}"))
                    })?;
                    model
                        .embed(texts, Some(batch_size))
                        .map_err(|e| DocentError::Embedding(e.to_string()))
                })
                .await
                .map_err(|e| DocentError::Embedding(format!("Embedding worker failed: {e}")))?
            }
            EmbeddingBackend::Api { client } => {
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                client.embed(&refs).await
            }
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl Embedder for EmbeddingProvider {
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocentError::Embedding("No embedding generated".to_string()))
    }

    async fn embed_passages(&self, passages: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.embed(passages).await
    }
}

fn resolve_embedding_model(model_name: &str) -> EmbeddingModel {
    match model_name {
        "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "all-MiniLM-L12-v2" | "sentence-transformers/all-MiniLM-L12-v2" => {
            EmbeddingModel::AllMiniLML12V2
        }
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            EmbeddingModel::NomicEmbedTextV15
        }
        _ => EmbeddingModel::AllMiniLML6V2,
    }
}

fn build_model(embedding_model: EmbeddingModel) -> Result<TextEmbedding> {
    TextEmbedding::try_new(InitOptions::new(embedding_model).with_show_download_progress(false))
        .map_err(|e| DocentError::Embedding(e.to_string()))
}
