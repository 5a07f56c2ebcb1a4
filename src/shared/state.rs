use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::LlmProvider;
use crate::storage::RecordStore;
use crate::tickets::service::TicketService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub tickets: TicketService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn RecordStore>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            config,
            tickets: TicketService::new(store, llm),
        }
    }
}
