use crate::policy::{PolicyRule, validate_rules};
use crate::PolicyResult;
use async_trait::async_trait;

/// Durable, ordered storage for policy rules.
///
/// Implementations return rules in insertion order and replace the whole set
/// atomically: a failed `replace_rules` must leave the previous set readable.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn load_rules(&self) -> PolicyResult<Vec<PolicyRule>>;
    async fn replace_rules(&self, rules: &[PolicyRule]) -> PolicyResult<()>;
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness check; defaults to a full read.
    async fn health_check(&self) -> PolicyResult<()> {
        self.load_rules().await.map(|_| ())
    }
}

/// Clear the store and write `rules` in order, all-or-nothing.
///
/// Rules are validated before the store is touched.
pub async fn seed(store: &dyn PolicyStore, rules: &[PolicyRule]) -> PolicyResult<()> {
    validate_rules(rules)?;
    store.replace_rules(rules).await?;
    tracing::info!(
        backend = store.backend_name(),
        rules = rules.len(),
        "policy rules seeded"
    );
    Ok(())
}
