use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docent::api::{create_router, AppState};
use docent::cache::ResponseCache;
use docent::clock::{Clock, SystemClock};
use docent::config::Config;
use docent::embeddings::EmbeddingProvider;
use docent::knowledge::{segment, KnowledgeLoader};
use docent::llm::LlmProvider;
use docent::services::{
    CacheSweeper, ChatService, ChatServiceOptions, KnowledgeBase, KnowledgeReloader,
    KnowledgeSettings, RetryPolicy, SessionSweeper,
};
use docent::session::SessionStore;
use docent::traits::{Embedder, Generator};

#[derive(Parser)]
#[command(name = "docent")]
#[command(about = "Visitor chat answered from a structured company knowledge base")]
struct Args {
    /// Knowledge document to serve (overrides KNOWLEDGE_BASE_PATH)
    #[arg(long, value_name = "PATH")]
    knowledge: Option<PathBuf>,

    /// Port to listen on (overrides DOCENT_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Validate the knowledge document, print its chunk count and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let mut config = Config::from_env();
    if let Some(path) = &args.knowledge {
        config.knowledge.path = path.display().to_string();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "docent=info,tower_http=debug".into());
    if config.server.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let loader = KnowledgeLoader::new(&config.knowledge.path);

    if args.check {
        let loaded = loader.load().await?;
        let chunks = segment(&loaded.document)?;
        println!(
            "{}: {} chunks, sha256 {}",
            loader.path().display(),
            chunks.len(),
            loaded.digest
        );
        return Ok(());
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "DOCENT_API_KEYS is not set, admin endpoints are locked. Set DOCENT_API_KEYS to enable /admin/* routes."
        );
    }

    tracing::info!("Loading embedding model: {}...", config.embeddings.model);
    let embeddings = EmbeddingProvider::new(&config.embeddings)?;
    tracing::info!(dimensions = embeddings.dimensions(), "Embedding model loaded");
    let embedder: Arc<dyn Embedder> = Arc::new(embeddings);

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - confident answers will degrade to the contact fallback");
    }
    let generator: Arc<dyn Generator> = Arc::new(llm.clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let retry = RetryPolicy::new(&config.retry);

    let knowledge = Arc::new(KnowledgeBase::new(
        loader,
        Arc::clone(&embedder),
        retry.clone(),
        KnowledgeSettings::from_config(&config),
    ));
    tracing::info!("Loading knowledge base from {}...", config.knowledge.path);
    let outcome = knowledge.reload().await?;
    tracing::info!(chunks = outcome.chunk_count, "Knowledge base ready");

    let sessions = Arc::new(SessionStore::new(&config.session, Arc::clone(&clock)));
    let cache = Arc::new(ResponseCache::new(&config.cache, Arc::clone(&clock)));

    let chat = Arc::new(ChatService::new(
        knowledge,
        Arc::clone(&sessions),
        Arc::clone(&cache),
        embedder,
        generator,
        retry,
        clock,
        ChatServiceOptions {
            top_k: config.retrieval.top_k,
            cache_enabled: config.cache.enabled,
        },
    ));

    let cancel_token = CancellationToken::new();

    tracing::info!("Starting session sweeper...");
    let sweeper = SessionSweeper::new(sessions, config.session.sweep_interval_secs.max(1));
    let token = cancel_token.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Session sweeper shutting down...");
                    break;
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(sweeper.interval_secs())) => {
                    if let Err(e) = sweeper.run_once().await {
                        tracing::error!("Session sweeper error: {}", e);
                    }
                }
            }
        }
    });

    tracing::info!("Starting cache sweeper...");
    let cache_sweeper = CacheSweeper::new(cache, config.cache.sweep_interval_secs.max(1));
    let token = cancel_token.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Cache sweeper shutting down...");
                    break;
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(cache_sweeper.interval_secs())) => {
                    if let Err(e) = cache_sweeper.run_once().await {
                        tracing::error!("Cache sweeper error: {}", e);
                    }
                }
            }
        }
    });

    if config.knowledge.reload_interval_secs > 0 {
        tracing::info!(
            "Starting knowledge reloader... (interval={}s)",
            config.knowledge.reload_interval_secs
        );
        let reloader = KnowledgeReloader::new(Arc::clone(&chat), config.knowledge.reload_interval_secs);
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Knowledge reloader shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(tokio::time::Duration::from_secs(reloader.interval_secs())) => {
                        // Failures are logged by the reloader; the previous index keeps serving.
                        let _ = reloader.run_once().await;
                    }
                }
            }
        });
    }

    let state = AppState::new(config.clone(), Arc::clone(&chat), llm);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Docent starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    chat.shutdown();
    tracing::info!("Docent stopped");

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
