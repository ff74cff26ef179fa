use std::sync::Arc;

use crate::config::Config;
use crate::llm::LlmProvider;
use crate::services::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<ChatService>,
    /// Kept for health reporting; generation goes through `chat`.
    pub llm: LlmProvider,
}

impl AppState {
    pub fn new(config: Config, chat: Arc<ChatService>, llm: LlmProvider) -> Self {
        Self {
            config: Arc::new(config),
            chat,
            llm,
        }
    }
}
