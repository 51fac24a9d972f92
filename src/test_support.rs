//! Helpers shared by unit tests.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::embedding::MockEmbedder;
use crate::jobs::{JobWorker, WorkerConfig};
use crate::llm::MockChatProvider;
use crate::matching::MatchingConfig;
use crate::service::ReclaimService;
use crate::store::MemoryStore;

/// Serves `router` on an ephemeral port and returns its base URL.
pub(crate) async fn spawn_fake_provider(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// A worker over `store` and `llm` with no embedder and no vector index,
/// so matching always takes the recency path.
pub(crate) fn worker_with(
    store: Arc<MemoryStore>,
    llm: Arc<MockChatProvider>,
    config: WorkerConfig,
) -> JobWorker {
    ReclaimService::assemble(
        store,
        Arc::new(MockEmbedder::disabled()),
        None,
        llm,
        MatchingConfig::default(),
        config,
    )
    .worker()
    .clone()
}
