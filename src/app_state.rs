use std::sync::Arc;

use crate::config::Config;
use crate::db::store::ProcurementStore;
use crate::middleware::auth::ContextCache;
use crate::payment::gateway::PaymentGateway;
use crate::payment::service::PaymentService;
use crate::workflow::engine::WorkflowEngine;
use crate::workflow::schema::Capabilities;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ProcurementStore>,
    pub capabilities: Arc<Capabilities>,
    pub engine: Arc<WorkflowEngine>,
    pub payments: Arc<PaymentService>,
    pub contexts: ContextCache,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ProcurementStore>,
        gateway: Arc<dyn PaymentGateway>,
        capabilities: Arc<Capabilities>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(WorkflowEngine::new(store.clone(), capabilities.clone())),
            payments: Arc::new(PaymentService::new(gateway, store.clone(), capabilities.clone())),
            contexts: crate::middleware::auth::create_context_cache(),
            store,
            capabilities,
        }
    }
}
