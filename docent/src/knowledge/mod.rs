mod document;
mod loader;
mod segmenter;

pub use document::{
    Company, ContactPath, Faq, FaqEntry, KnowledgeDocument, Service, Team, TeamMember,
};
pub use loader::{KnowledgeLoader, LoadedDocument};
pub use segmenter::segment;
