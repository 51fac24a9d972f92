//! Reclaim HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use reclaim::config::Config;
use reclaim::gateway::{HandlerState, create_router};
use reclaim::{
    ChatProvider, Embedder, ItemIndex, JobWorker, MemoryStore, OpenAiChatClient, OpenAiEmbedder,
    QdrantItemIndex, ReclaimService, RestStore, Store,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Reclaim starting"
    );

    let store: Arc<dyn Store> = match config.store_config() {
        Some(store_config) => {
            tracing::info!(url = %store_config.base_url, "Using PostgREST store");
            Arc::new(RestStore::new(store_config)?)
        }
        None => {
            tracing::warn!("No RECLAIM_STORE_URL configured, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(config.embedding_config())?);
    let llm: Arc<dyn ChatProvider> = Arc::new(OpenAiChatClient::new(config.chat_config())?);
    if !llm.is_enabled() {
        tracing::warn!(
            "No provider key configured; matching is skipped and claims are marked unavailable"
        );
    }

    let index: Option<Arc<dyn ItemIndex>> = match &config.qdrant_url {
        Some(url) => {
            let index = QdrantItemIndex::new(
                url,
                config.qdrant_api_key.as_deref(),
                config.qdrant_collection.clone(),
                config.embedding_dim,
            )?;
            match index.ensure_collection().await {
                Ok(()) => Some(Arc::new(index) as Arc<dyn ItemIndex>),
                Err(e) => {
                    tracing::warn!(error = %e, "Qdrant unavailable; using recency retrieval only");
                    None
                }
            }
        }
        None => {
            tracing::info!("No RECLAIM_QDRANT_URL configured, using recency retrieval only");
            None
        }
    };
    let vector_index = index.is_some();

    let service = Arc::new(ReclaimService::assemble(
        store,
        embedder,
        index,
        llm.clone(),
        config.matching.clone(),
        config.worker_config(),
    ));
    let worker = service.worker().clone();
    let worker_handle = worker.spawn();

    let app = create_router(HandlerState::new(service, llm.is_enabled(), vector_index));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(worker))
        .await?;

    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Job worker task failed");
    }
    tracing::info!("Reclaim shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("RECLAIM_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal(worker: JobWorker) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    tracing::info!("Stopping job worker; unfinished jobs resume on next start");
    worker.shutdown();
}
