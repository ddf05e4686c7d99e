//! Application state shared across all request handlers

use std::sync::Arc;

use crate::allocator::{Allocator, CodeSource, RandomCodeSource};
use crate::config::Config;
use crate::database::Store;
use crate::middleware::RateLimit;

/// Cloned into every handler by axum; everything inside is behind an `Arc`
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub allocator: Allocator,
    pub config: Arc<Config>,
    /// Applies to every `/api/*` request
    pub api_limit: Arc<RateLimit>,
    /// Applies to link creation only
    pub shorten_limit: Arc<RateLimit>,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        Self::with_code_source(store, config, Arc::new(RandomCodeSource::default()))
    }

    pub fn with_code_source(store: Store, config: Config, codes: Arc<dyn CodeSource>) -> Self {
        let store = Arc::new(store);
        let allocator = Allocator::new(store.clone(), codes);
        Self::from_parts(store, allocator, config)
    }

    /// Builds state around an allocator that shares `store`
    pub fn from_parts(store: Arc<Store>, allocator: Allocator, config: Config) -> Self {
        Self {
            allocator,
            api_limit: Arc::new(RateLimit::per_minute(config.rate_limit_per_minute)),
            shorten_limit: Arc::new(RateLimit::per_minute(config.shorten_limit_per_minute)),
            config: Arc::new(config),
            store,
        }
    }
}
