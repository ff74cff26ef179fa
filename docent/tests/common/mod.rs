// Shared fakes and fixtures for integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;

use docent::cache::ResponseCache;
use docent::clock::{Clock, ManualClock};
use docent::config::{CacheConfig, Config, RetryConfig, SessionConfig};
use docent::error::{DocentError, Result};
use docent::knowledge::KnowledgeLoader;
use docent::services::{ChatService, ChatServiceOptions, KnowledgeBase, KnowledgeSettings, RetryPolicy};
use docent::session::SessionStore;
use docent::traits::{Embedder, GenerationRequest, Generator};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub const CONTACT: &str = "email us at hello@acme.example or visit https://acme.example";

/// Word groups, one vector dimension each.
const CONCEPTS: &[&[&str]] = &[
    &["rpo"],
    &["bpo", "payroll"],
    &["cost", "costs", "price", "pricing", "fee", "fees", "much"],
    &["contact", "email", "reach", "website"],
    &["hiring", "hire", "recruitment", "roles", "fill"],
    &["founder", "ceo", "team"],
];
const QUERY_MISC: usize = CONCEPTS.len();
const PASSAGE_MISC: usize = CONCEPTS.len() + 1;
const DIMENSIONS: usize = CONCEPTS.len() + 2;

/// Bag-of-concepts embedder: one dimension per word group, 1.0 when any word
/// of the group appears. Text with no known words lands on a dimension that
/// queries and passages never share, so it scores 0 against everything.
#[derive(Default)]
pub struct ConceptEmbedder {
    pub query_calls: AtomicUsize,
    pub passage_calls: AtomicUsize,
}

impl ConceptEmbedder {
    pub fn vector(text: &str, misc: usize) -> Vec<f32> {
        let tokens: HashSet<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let mut vector = vec![0.0; DIMENSIONS];
        for (dim, words) in CONCEPTS.iter().enumerate() {
            if words.iter().any(|w| tokens.contains(*w)) {
                vector[dim] = 1.0;
            }
        }
        if vector.iter().all(|v| *v == 0.0) {
            vector[misc] = 1.0;
        }
        vector
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for ConceptEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text, QUERY_MISC))
    }

    async fn embed_passages(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.passage_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t, PASSAGE_MISC)).collect())
    }
}

/// Generator that records each request and answers from a script.
pub struct RecordingGenerator {
    reply: Mutex<std::result::Result<String, String>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
}

impl RecordingGenerator {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(reply.to_string())),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a retryable upstream error.
    pub fn failing(message: &str) -> Self {
        let generator = Self::answering("");
        *generator.reply.lock().unwrap() = Err(message.to_string());
        generator
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = Ok(reply.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests().pop().expect("generator was never called")
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match &*self.reply.lock().unwrap() {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(DocentError::Llm(message.clone())),
        }
    }
}

/// Generator that parks every call until the test releases it.
pub struct GatedGenerator {
    reply: String,
    entered: tokio::sync::Notify,
    release: tokio::sync::Semaphore,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl GatedGenerator {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Semaphore::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Resolves once a call is parked at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets `n` parked or future calls through.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("generator was never called")
    }
}

#[async_trait]
impl Generator for GatedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.entered.notify_one();
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|e| DocentError::Internal(e.to_string()))?;
        permit.forget();
        Ok(self.reply.clone())
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 1,
        max_delay_ms: 4,
        call_timeout_secs: 5,
    }
}

pub struct Harness {
    pub chat: Arc<ChatService>,
    pub embedder: Arc<ConceptEmbedder>,
    pub generator: Arc<RecordingGenerator>,
    pub clock: ManualClock,
}

/// Chat service over `knowledge_path`, loaded and ready to answer.
pub async fn harness(knowledge_path: &Path, generator: RecordingGenerator) -> Harness {
    let generator = Arc::new(generator);
    let (chat, embedder, clock) = chat_service(knowledge_path, generator.clone()).await;
    Harness {
        chat,
        embedder,
        generator,
        clock,
    }
}

/// Loaded chat service over `knowledge_path` with any generator.
pub async fn chat_service(
    knowledge_path: &Path,
    generator: Arc<dyn Generator>,
) -> (Arc<ChatService>, Arc<ConceptEmbedder>, ManualClock) {
    init_test_logger();

    let mut config = Config::default();
    config.session = SessionConfig::default();
    config.cache = CacheConfig::default();
    config.retry = fast_retry();
    config.contact = Default::default();
    config.llm = None;

    let clock = ManualClock::default();
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let embedder = Arc::new(ConceptEmbedder::default());
    let retry = RetryPolicy::new(&config.retry);

    let knowledge = Arc::new(KnowledgeBase::new(
        KnowledgeLoader::new(knowledge_path),
        embedder.clone(),
        retry.clone(),
        KnowledgeSettings::from_config(&config),
    ));
    knowledge.reload().await.expect("initial knowledge load");

    let chat = ChatService::new(
        knowledge,
        Arc::new(SessionStore::new(&config.session, Arc::clone(&shared_clock))),
        Arc::new(ResponseCache::new(&config.cache, Arc::clone(&shared_clock))),
        embedder.clone(),
        generator,
        retry,
        shared_clock,
        ChatServiceOptions::default(),
    );

    (Arc::new(chat), embedder, clock)
}
