use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use deadpool_redis::Pool;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::gateway::MarketplaceApi;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn MarketplaceApi>,
    pub db_pool: PgPool,
    pub redis_pool: Pool,
    pub shared_state: SharedState,
}

#[derive(Clone, Default)]
pub struct SharedState {
    /// Last webhook-triggered refresh per trip, for throttling. The only
    /// in-process state shared across requests; resolution passes
    /// themselves share nothing.
    pub recent_polls: Arc<DashMap<String, Instant>>,
}
