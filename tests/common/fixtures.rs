//! Items, questions and a wired service over in-memory backends.

use std::sync::Arc;

use reclaim::model::{Item, ItemStatus, Location, Question};
use reclaim::vectordb::ItemIndex;
use reclaim::{
    Embedder, MatchingConfig, MemoryStore, MockChatProvider, ReclaimService, Store, WorkerConfig,
};
use uuid::Uuid;

pub const FOUND_WALLET_DESCRIPTION: &str = "Black leather bifold wallet with a zipper coin \
pocket, two credit cards, a library card and a faded receipt from a coffee shop";

pub fn lost_wallet(owner_id: Uuid) -> Item {
    Item::new(
        owner_id,
        ItemStatus::Lost,
        "Black wallet",
        "Lost near the ticket machines",
        "Accessories",
        Location::new("Central Station").with_city_state("Austin", "TX"),
    )
}

pub fn found_wallet(owner_id: Uuid) -> Item {
    Item::new(
        owner_id,
        ItemStatus::Found,
        "Wallet, black leather",
        FOUND_WALLET_DESCRIPTION,
        "Accessories",
        Location::new("Central Station").with_city_state("Austin", "TX"),
    )
}

pub struct TestBed {
    pub store: Arc<MemoryStore>,
    pub llm: Arc<MockChatProvider>,
    pub service: ReclaimService,
}

impl TestBed {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<dyn ItemIndex>>,
        llm: MockChatProvider,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let llm = Arc::new(llm);
        let service = ReclaimService::assemble(
            store.clone(),
            embedder,
            index,
            llm.clone(),
            MatchingConfig::default(),
            WorkerConfig::default(),
        );
        Self {
            store,
            llm,
            service,
        }
    }

    pub async fn insert(&self, item: Item) -> Item {
        self.store.insert_item(item).await.expect("insert item")
    }

    pub async fn ask(&self, item_id: Uuid, text: &str, answer: Option<&str>) -> Question {
        let mut question = Question::new(item_id, text);
        if let Some(answer) = answer {
            question = question.with_answer(answer);
        }
        self.store
            .insert_question(question)
            .await
            .expect("insert question")
    }

    /// Drains every due job once.
    pub async fn run_jobs(&self) -> usize {
        self.service.worker().run_due().await.expect("run jobs")
    }
}
