use std::path::{Path, PathBuf};

use crate::cache::sha256_hex;
use crate::error::{DocentError, Result};

use super::KnowledgeDocument;

/// A parsed knowledge document together with the digest of its raw bytes.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: KnowledgeDocument,
    pub digest: String,
}

/// Reads the knowledge base JSON file from disk.
#[derive(Debug, Clone)]
pub struct KnowledgeLoader {
    path: PathBuf,
}

impl KnowledgeLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Digest of the file as it currently sits on disk, without parsing it.
    pub async fn digest(&self) -> Result<String> {
        let bytes = self.read().await?;
        Ok(sha256_hex(&bytes))
    }

    pub async fn load(&self) -> Result<LoadedDocument> {
        let bytes = self.read().await?;
        let digest = sha256_hex(&bytes);
        let document: KnowledgeDocument = serde_json::from_slice(&bytes).map_err(|e| {
            DocentError::Segmentation(format!(
                "Knowledge base at {} is not valid JSON: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), digest = %digest, "Loaded knowledge document");
        Ok(LoadedDocument { document, digest })
    }

    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            DocentError::Segmentation(format!(
                "Failed to read knowledge base at {}: {e}",
                self.path.display()
            ))
        })
    }
}
