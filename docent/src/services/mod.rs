mod chat;
mod knowledge_base;
mod maintenance;
mod retry;

pub use chat::{ChatService, ChatServiceOptions};
pub use knowledge_base::{KnowledgeBase, KnowledgeSettings, KnowledgeSnapshot, ReloadOutcome};
pub use maintenance::{CacheSweeper, KnowledgeReloader, SessionSweeper};
pub use retry::RetryPolicy;
