//! `catalog-server`: REST endpoints over the flat-file item catalog.
//!
//! ## Routes
//! - `GET  /api/items?q=&limit=&page=` → `{ items, total }`
//! - `GET  /api/items/:id`             → item or 404
//! - `POST /api/items`                 → 201 with the created item
//! - `GET  /api/stats`                 → `{ total, byCategory }`

pub mod config;
pub mod error;
pub mod http;
pub mod routes;

use std::sync::Arc;

use catalog_store::ItemStore;
use catalog_store::StatsCache;

pub use config::ConfigError;
pub use config::ServerConfig;
pub use error::ApiError;
pub use http::ServerHandle;

/// State shared by every worker thread.
pub struct CatalogService {
    store: Arc<ItemStore>,
    stats: StatsCache,
}

impl CatalogService {
    pub fn new(store: Arc<ItemStore>) -> Self {
        let stats = StatsCache::new(Arc::clone(&store));
        Self { store, stats }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn stats(&self) -> &StatsCache {
        &self.stats
    }
}

/// Open the configured store and start serving it.
pub fn start(config: &ServerConfig) -> std::io::Result<ServerHandle> {
    let store = Arc::new(ItemStore::open(&config.data_path));
    http::start(config, Arc::new(CatalogService::new(store)))
}
