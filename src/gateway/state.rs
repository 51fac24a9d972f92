use std::sync::Arc;

use crate::service::ReclaimService;

#[derive(Clone)]
pub struct HandlerState {
    pub service: Arc<ReclaimService>,

    /// Whether a language model provider key is configured.
    pub ai_enabled: bool,

    /// Whether retrieval has a vector index behind it.
    pub vector_index: bool,
}

impl HandlerState {
    pub fn new(service: Arc<ReclaimService>, ai_enabled: bool, vector_index: bool) -> Self {
        Self {
            service,
            ai_enabled,
            vector_index,
        }
    }
}
