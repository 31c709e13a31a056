//! Policy store backends.
//!
//! `memory` is process-local and starts from the stock rule set; `postgres`
//! is the durable backend shared by every gateway replica.
use crate::config::{StorageBackend, StorageConfig};
use anyhow::Context;
use carwash_authz::{PolicyStore, default_rules};
use std::sync::Arc;

pub mod memory;
pub mod postgres;

/// Open the configured backend.
///
/// The in-memory backend is bootstrapped with [`default_rules`] since nothing
/// else could ever seed it.
pub async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn PolicyStore>> {
    let store: Arc<dyn PolicyStore> = match config.backend {
        StorageBackend::Memory => Arc::new(memory::InMemoryPolicyStore::with_rules(default_rules())),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(postgres::PostgresPolicyStore::connect(pg).await?)
        }
    };
    tracing::info!(backend = store.backend_name(), "policy store ready");
    Ok(store)
}
