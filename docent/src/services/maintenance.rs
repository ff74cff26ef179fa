use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::ResponseCache;
use crate::error::Result;
use crate::session::SessionStore;

use super::ChatService;

/// Periodically removes expired sessions so idle visitors do not pile up.
#[derive(Clone)]
pub struct SessionSweeper {
    sessions: Arc<SessionStore>,
    interval_secs: u64,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionStore>, interval_secs: u64) -> Self {
        Self {
            sessions,
            interval_secs,
        }
    }

    /// Returns the number of sessions removed.
    pub async fn run_once(&self) -> Result<usize> {
        let removed = self.sessions.sweep();
        if removed > 0 {
            info!(removed, resident = self.sessions.resident(), "Swept expired sessions");
        } else {
            debug!("No expired sessions to sweep");
        }
        Ok(removed)
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}

/// Periodically drops expired cache entries.
#[derive(Clone)]
pub struct CacheSweeper {
    cache: Arc<ResponseCache>,
    interval_secs: u64,
}

impl CacheSweeper {
    pub fn new(cache: Arc<ResponseCache>, interval_secs: u64) -> Self {
        Self {
            cache,
            interval_secs,
        }
    }

    pub async fn run_once(&self) -> Result<usize> {
        let removed = self.cache.sweep();
        if removed > 0 {
            info!(removed, "Swept expired cache entries");
        }
        Ok(removed)
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}

/// Polls the knowledge file and rebuilds the index when its content changes.
#[derive(Clone)]
pub struct KnowledgeReloader {
    chat: Arc<ChatService>,
    interval_secs: u64,
}

impl KnowledgeReloader {
    pub fn new(chat: Arc<ChatService>, interval_secs: u64) -> Self {
        Self {
            chat,
            interval_secs,
        }
    }

    /// Returns whether a new snapshot was swapped in. A failed rebuild is
    /// logged and leaves the previous snapshot serving.
    pub async fn run_once(&self) -> Result<bool> {
        match self.chat.reload_knowledge(false).await {
            Ok(Some(outcome)) => {
                info!(chunks = outcome.chunk_count, "Knowledge document changed, index rebuilt");
                Ok(true)
            }
            Ok(None) => {
                debug!("Knowledge document unchanged");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Knowledge reload failed, keeping previous index");
                Err(e)
            }
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}
