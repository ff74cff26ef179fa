use std::sync::Arc;

use crate::cache::{CachedResponse, ResponseCache};
use crate::clock::Clock;
use crate::error::{DocentError, Result};
use crate::models::{CacheStats, ChatReply, ConfidenceTier, SessionStats, Turn};
use crate::session::SessionStore;
use crate::traits::{Embedder, GenerationRequest, Generator};

use super::knowledge_base::{KnowledgeBase, KnowledgeSnapshot, ReloadOutcome};
use super::RetryPolicy;

/// How the answer text for one message was produced.
enum Answer {
    Generated {
        text: String,
        tier: ConfidenceTier,
        sources_used: usize,
    },
    Fallback {
        text: String,
    },
    /// An external call failed; never cached.
    Degraded {
        text: String,
    },
}

pub struct ChatServiceOptions {
    pub top_k: usize,
    pub cache_enabled: bool,
}

impl Default for ChatServiceOptions {
    fn default() -> Self {
        Self {
            top_k: crate::retrieval::DEFAULT_TOP_K,
            cache_enabled: true,
        }
    }
}

/// Request orchestrator: session, cache, retrieval, routing and generation.
///
/// External calls run outside every store lock.
pub struct ChatService {
    knowledge: Arc<KnowledgeBase>,
    sessions: Arc<SessionStore>,
    cache: Arc<ResponseCache>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    options: ChatServiceOptions,
}

impl ChatService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        sessions: Arc<SessionStore>,
        cache: Arc<ResponseCache>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
        options: ChatServiceOptions,
    ) -> Self {
        Self {
            knowledge,
            sessions,
            cache,
            embedder,
            generator,
            retry,
            clock,
            options,
        }
    }

    pub async fn handle_message(
        &self,
        session_id: Option<&str>,
        message: &str,
        use_cache: bool,
    ) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DocentError::Validation("Message cannot be empty".to_string()));
        }
        let snapshot = self
            .knowledge
            .snapshot()
            .ok_or_else(|| DocentError::Internal("Knowledge base is not loaded".to_string()))?;
        // read after the snapshot: a reload swaps first, then clears
        let cache_generation = self.cache.generation();

        let (session_id, is_new) = self.sessions.resolve(session_id);
        let use_cache = use_cache && self.options.cache_enabled;

        if use_cache {
            if let Some(hit) = self.cache.get(message) {
                tracing::info!(session_id = %session_id, tier = %hit.tier, "Cache hit");
                let session_id = self.record_exchange(session_id, message, &hit.response);
                return Ok(ChatReply {
                    response_text: hit.response,
                    session_id,
                    confidence_tier: hit.tier,
                    cache_hit: true,
                    sources_used: hit.sources_used,
                });
            }
        }

        let history = if is_new {
            Vec::new()
        } else {
            self.sessions.read(&session_id).unwrap_or_default()
        };

        let answer = self.answer(&snapshot, message, history).await;
        let (text, tier, sources_used) = match answer {
            Answer::Generated {
                text,
                tier,
                sources_used,
            } => {
                if use_cache {
                    self.cache.put_if_current(
                        message,
                        CachedResponse {
                            response: text.clone(),
                            tier,
                            sources_used,
                        },
                        cache_generation,
                    );
                }
                (text, tier, sources_used)
            }
            Answer::Fallback { text } => {
                if use_cache {
                    self.cache.put_if_current(
                        message,
                        CachedResponse {
                            response: text.clone(),
                            tier: ConfidenceTier::Low,
                            sources_used: 0,
                        },
                        cache_generation,
                    );
                }
                (text, ConfidenceTier::Low, 0)
            }
            Answer::Degraded { text } => (text, ConfidenceTier::Low, 0),
        };

        let session_id = self.record_exchange(session_id, message, &text);
        Ok(ChatReply {
            response_text: text,
            session_id,
            confidence_tier: tier,
            cache_hit: false,
            sources_used,
        })
    }

    async fn answer(&self, snapshot: &KnowledgeSnapshot, message: &str, history: Vec<Turn>) -> Answer {
        let templates = snapshot.router.templates();

        let embedder = Arc::clone(&self.embedder);
        let query_embedding = match self
            .retry
            .run("embedding", || {
                let embedder = Arc::clone(&embedder);
                let message = message.to_string();
                async move { embedder.embed_query(&message).await }
            })
            .await
        {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(error = %e, "Query embedding failed, returning fallback");
                return Answer::Degraded {
                    text: templates.service_error(),
                };
            }
        };

        let results = match snapshot.index.query(&query_embedding, self.options.top_k) {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "Ranking failed, returning fallback");
                return Answer::Degraded {
                    text: templates.service_error(),
                };
            }
        };

        let decision = snapshot.router.classify(&results, message);
        tracing::info!(
            tier = %decision.tier,
            intent = %decision.intent,
            top_score = decision.top_score,
            results = results.len(),
            "Routed message"
        );

        if let Some(fallback) = decision.fallback {
            return Answer::Fallback { text: fallback };
        }

        let request = GenerationRequest {
            system_instruction: snapshot.system_instruction.clone(),
            context: results.iter().map(|r| r.chunk.content.clone()).collect(),
            history,
            message: message.to_string(),
        };
        let generator = Arc::clone(&self.generator);
        let request = Arc::new(request);
        let generated = self
            .retry
            .run("generation", || {
                let generator = Arc::clone(&generator);
                let request = Arc::clone(&request);
                async move { generator.generate(&request).await }
            })
            .await;

        let text = match generated {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Generator returned empty text, returning fallback");
                return Answer::Degraded {
                    text: templates.service_error(),
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed, returning fallback");
                return Answer::Degraded {
                    text: templates.service_error(),
                };
            }
        };

        let text = match decision.tier {
            ConfidenceTier::Medium => format!("{text}\n\n{}", templates.handoff_suggestion()),
            ConfidenceTier::High | ConfidenceTier::Low => text,
        };
        Answer::Generated {
            text,
            tier: decision.tier,
            sources_used: results.len(),
        }
    }

    /// Appends the user/assistant pair. If the session expired while the
    /// request was in flight, the pair starts a new session instead.
    fn record_exchange(&self, session_id: String, message: &str, response: &str) -> String {
        let now = self.clock.now();
        let turns = || vec![Turn::user(message, now), Turn::assistant(response, now)];

        match self.sessions.append_all(&session_id, turns()) {
            Ok(()) => session_id,
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Session gone, starting a new one");
                let (fresh, _) = self.sessions.resolve(None);
                if let Err(e) = self.sessions.append_all(&fresh, turns()) {
                    tracing::warn!(session_id = %fresh, error = %e, "Failed to record exchange");
                }
                fresh
            }
        }
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        tracing::info!(removed, "Response cache cleared");
        removed
    }

    pub fn get_session_stats(&self) -> SessionStats {
        self.sessions.stats()
    }

    /// Snapshot of one session's history, oldest first.
    pub fn session_history(&self, session_id: &str) -> Result<Vec<Turn>> {
        self.sessions.read(session_id)
    }

    /// Rebuild the knowledge snapshot. Cached answers were derived from the
    /// old corpus, so a successful reload clears the cache.
    pub async fn reload_knowledge(&self, force: bool) -> Result<Option<ReloadOutcome>> {
        let outcome = if force {
            Some(self.knowledge.reload().await?)
        } else {
            self.knowledge.reload_if_changed().await?
        };

        if outcome.is_some() {
            let removed = self.cache.clear();
            tracing::info!(removed, "Cleared response cache after knowledge reload");
        }
        Ok(outcome)
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn shutdown(&self) {
        self.sessions.shutdown();
        self.cache.shutdown();
    }
}
