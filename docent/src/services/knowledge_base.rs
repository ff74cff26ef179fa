use std::sync::{Arc, RwLock};

use crate::config::{Config, ContactConfig, RetrievalConfig};
use crate::error::Result;
use crate::knowledge::{segment, ContactPath, KnowledgeLoader};
use crate::llm::prompts;
use crate::retrieval::VectorIndex;
use crate::routing::{ConfidenceRouter, FallbackTemplates};
use crate::traits::Embedder;

use super::RetryPolicy;

/// Settings that shape the router and system instruction built from a document.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeSettings {
    pub retrieval: RetrievalConfig,
    pub contact_overrides: ContactPath,
    pub system_prompt: Option<String>,
}

impl KnowledgeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retrieval: config.retrieval.clone(),
            contact_overrides: contact_path_from(&config.contact),
            system_prompt: config.llm.as_ref().and_then(|llm| llm.system_prompt.clone()),
        }
    }
}

fn contact_path_from(config: &ContactConfig) -> ContactPath {
    ContactPath {
        email: config.email.clone(),
        website: config.website.clone(),
        phone: config.phone.clone(),
    }
}

/// Everything derived from one version of the knowledge document.
pub struct KnowledgeSnapshot {
    pub index: VectorIndex,
    pub router: ConfidenceRouter,
    pub system_instruction: String,
    pub company: String,
    pub digest: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub chunk_count: usize,
    pub digest: String,
}

/// Owns the active knowledge snapshot and rebuilds it from disk.
///
/// A rebuild produces a complete new snapshot before swapping it in; requests
/// holding the previous `Arc` finish against the corpus they started with.
pub struct KnowledgeBase {
    loader: KnowledgeLoader,
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    settings: KnowledgeSettings,
    current: RwLock<Option<Arc<KnowledgeSnapshot>>>,
    rebuild: tokio::sync::Mutex<()>,
}

impl KnowledgeBase {
    pub fn new(
        loader: KnowledgeLoader,
        embedder: Arc<dyn Embedder>,
        retry: RetryPolicy,
        settings: KnowledgeSettings,
    ) -> Self {
        Self {
            loader,
            embedder,
            retry,
            settings,
            current: RwLock::new(None),
            rebuild: tokio::sync::Mutex::new(()),
        }
    }

    /// The active snapshot, or `None` before the first successful load.
    pub fn snapshot(&self) -> Option<Arc<KnowledgeSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Load the document and swap in a freshly built snapshot.
    ///
    /// On error the previous snapshot, if any, keeps serving.
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        let _guard = self.rebuild.lock().await;
        self.rebuild_locked().await
    }

    /// Reload only when the file digest differs from the active snapshot.
    pub async fn reload_if_changed(&self) -> Result<Option<ReloadOutcome>> {
        let _guard = self.rebuild.lock().await;
        let digest = self.loader.digest().await?;
        if self
            .snapshot()
            .is_some_and(|snapshot| snapshot.digest == digest)
        {
            return Ok(None);
        }
        self.rebuild_locked().await.map(Some)
    }

    async fn rebuild_locked(&self) -> Result<ReloadOutcome> {
        let loaded = self.loader.load().await?;
        let chunks = segment(&loaded.document)?;

        let passages: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embedder = Arc::clone(&self.embedder);
        let embeddings = self
            .retry
            .run("embedding", || {
                let embedder = Arc::clone(&embedder);
                let passages = passages.clone();
                async move { embedder.embed_passages(passages).await }
            })
            .await?;

        let contact = loaded
            .document
            .contact_path()
            .overridden_by(&self.settings.contact_overrides);
        let (company, description) = loaded
            .document
            .company
            .as_ref()
            .map(|c| (c.name.clone(), c.description.clone()))
            .unwrap_or_default();

        let router = ConfidenceRouter::new(
            &self.settings.retrieval,
            FallbackTemplates::new(company.clone(), &contact),
        )?;
        let system_instruction = self
            .settings
            .system_prompt
            .clone()
            .unwrap_or_else(|| prompts::system_instruction(&company, &description, &contact.describe()));

        let chunk_count = chunks.len();
        let index = VectorIndex::new();
        index.index(chunks, embeddings)?;

        let snapshot = Arc::new(KnowledgeSnapshot {
            index,
            router,
            system_instruction,
            company,
            digest: loaded.digest.clone(),
            chunk_count,
        });
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);

        tracing::info!(
            path = %self.loader.path().display(),
            chunks = chunk_count,
            digest = %&loaded.digest[..12.min(loaded.digest.len())],
            "Knowledge base loaded"
        );
        Ok(ReloadOutcome {
            chunk_count,
            digest: loaded.digest,
        })
    }
}
