use std::sync::Arc;

use crate::{config::Config, repos::FeatureStore, roadmap::Roadmap, stores::Stores};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Durable feature rows (PostgreSQL).
    pub store: Arc<dyn FeatureStore>,
    /// Ephemeral stores (Redis).
    pub stores: Stores,
    /// The roadmap ledger.
    pub roadmap: Arc<dyn Roadmap>,
}
