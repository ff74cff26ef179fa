use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Metadata;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Company,
    Services,
    Pricing,
    Faq,
    Team,
    Contact,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Company => write!(f, "company"),
            Self::Services => write!(f, "services"),
            Self::Pricing => write!(f, "pricing"),
            Self::Faq => write!(f, "faq"),
            Self::Team => write!(f, "team"),
            Self::Contact => write!(f, "contact"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(Self::Company),
            "services" => Ok(Self::Services),
            "pricing" => Ok(Self::Pricing),
            "faq" => Ok(Self::Faq),
            "team" => Ok(Self::Team),
            "contact" => Ok(Self::Contact),
            _ => Err(format!("Unknown category: {s}")),
        }
    }
}

/// A self-contained unit of knowledge-base text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub category: Category,
    pub content: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(id: impl Into<String>, category: Category, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Arc<Chunk>,
    pub score: f32,
}
