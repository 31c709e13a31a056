//! Policy engine: loads rules from a [`PolicyStore`] and answers access
//! decisions against the latest published snapshot.
//!
//! # Concurrency model
//! The current [`PolicySnapshot`] lives in an `ArcSwap`. Reloads build a new
//! snapshot off to the side and publish it with a single pointer swap, so a
//! decision always evaluates one complete rule set.
use crate::policy::{Decision, PolicyRule, PolicySnapshot};
use crate::store::{PolicyStore, seed};
use crate::{PolicyError, PolicyResult};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A snapshot tagged with the generation of the reload that built it.
struct Published {
    generation: u64,
    snapshot: Arc<PolicySnapshot>,
}

pub struct PolicyEngine {
    store: Arc<dyn PolicyStore>,
    current: ArcSwap<Published>,
    next_generation: AtomicU64,
}

impl PolicyEngine {
    /// Create an engine with an empty snapshot. Everything is denied until
    /// the first successful [`reload`](Self::reload).
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self {
            store,
            current: ArcSwap::from_pointee(Published {
                generation: 0,
                snapshot: Arc::new(PolicySnapshot::default()),
            }),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Create an engine and load the current rule set.
    pub async fn load(store: Arc<dyn PolicyStore>) -> PolicyResult<Self> {
        let engine = Self::new(store);
        engine.reload().await?;
        Ok(engine)
    }

    /// Re-read the full rule set, publish it, and return the published
    /// snapshot.
    ///
    /// Each reload takes a generation before reading the store. A reload that
    /// finishes after a later-started one has already published does not
    /// overwrite it; it returns the newer snapshot instead.
    ///
    /// # Errors
    /// - `PolicyError::Unavailable` when the store cannot be read; the previous
    ///   snapshot stays in place.
    pub async fn reload(&self) -> PolicyResult<Arc<PolicySnapshot>> {
        let started = std::time::Instant::now();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let rules = match self.store.load_rules().await {
            Ok(rules) => rules,
            Err(err) => {
                metrics::counter!("gateway_policy_reloads_total", "result" => "error").increment(1);
                return Err(match err {
                    PolicyError::Unavailable(_) => err,
                    other => PolicyError::unavailable(other),
                });
            }
        };
        let count = rules.len();
        let built = Arc::new(PolicySnapshot::new(rules));
        let previous = self.current.rcu(|current| {
            if current.generation > generation {
                Arc::clone(current)
            } else {
                Arc::new(Published {
                    generation,
                    snapshot: Arc::clone(&built),
                })
            }
        });
        metrics::histogram!("gateway_policy_reload_seconds").record(started.elapsed().as_secs_f64());

        if previous.generation > generation {
            metrics::counter!("gateway_policy_reloads_total", "result" => "superseded").increment(1);
            tracing::debug!(
                generation,
                published = previous.generation,
                "policy reload superseded by a newer one"
            );
            return Ok(Arc::clone(&previous.snapshot));
        }
        metrics::counter!("gateway_policy_reloads_total", "result" => "ok").increment(1);
        metrics::gauge!("gateway_policy_rules").set(count as f64);
        tracing::debug!(rules = count, generation, "policy snapshot published");
        Ok(built)
    }

    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        Arc::clone(&self.current.load().snapshot)
    }

    pub fn evaluate(&self, role: &str, resource_path: &str, action: &str) -> Decision {
        self.current.load().snapshot.evaluate(role, resource_path, action)
    }

    pub fn decide(&self, role: &str, resource_path: &str, action: &str) -> bool {
        self.evaluate(role, resource_path, action).allowed
    }

    /// Replace the stored rule set and publish it.
    ///
    /// Administrative operation; request handling never calls this.
    pub async fn seed(&self, rules: &[PolicyRule]) -> PolicyResult<()> {
        seed(self.store.as_ref(), rules).await?;
        self.reload().await.map(|_| ())
    }
}

/// Periodically reload `engine` until the returned task is aborted.
///
/// Failed reloads are logged and retried on the next tick; the last good
/// snapshot keeps serving decisions in the meantime.
pub fn spawn_policy_refresh(
    engine: Arc<PolicyEngine>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = engine.reload().await {
                tracing::warn!(kind = err.kind(), error = %err, "policy refresh failed");
            }
        }
    })
}
