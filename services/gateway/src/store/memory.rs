//! In-memory policy store.
//!
//! Not durable: rules live for the lifetime of the process and are not shared
//! between replicas. Intended for local development and tests.
use async_trait::async_trait;
use carwash_authz::{PolicyResult, PolicyRule, PolicyStore};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicyStore {
    rules: Arc<RwLock<Vec<PolicyRule>>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<PolicyRule>) -> Self {
        Self {
            rules: Arc::new(RwLock::new(rules)),
        }
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn load_rules(&self) -> PolicyResult<Vec<PolicyRule>> {
        Ok(self.rules.read().await.clone())
    }

    async fn replace_rules(&self, rules: &[PolicyRule]) -> PolicyResult<()> {
        let next = rules.to_vec();
        *self.rules.write().await = next;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> PolicyResult<()> {
        Ok(())
    }
}
