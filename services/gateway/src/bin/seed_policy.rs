//! Replace the durable policy rule set.
//!
//! Usage: `seed-policy [RULES.yaml]`. Without a file the stock car-wash rules
//! are written. Storage settings come from the same `GATEWAY_*` variables the
//! gateway reads.
use anyhow::{Context, bail};
use carwash_authz::{default_rules, seed};
use gateway::config::{StorageBackend, StorageConfig, load_policy_file};
use gateway::observability;
use gateway::store::postgres::PostgresPolicyStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_observability("carwash-seed-policy");
    let storage = StorageConfig::from_env().context("storage config")?;
    if storage.backend != StorageBackend::Postgres {
        bail!("seed-policy writes to durable storage; set GATEWAY_STORAGE=postgres");
    }
    let pg = storage
        .postgres
        .as_ref()
        .context("postgres configuration missing")?;

    let rules = match std::env::args().nth(1) {
        Some(path) => load_policy_file(&path)?,
        None => default_rules(),
    };

    let store = PostgresPolicyStore::connect(pg).await?;
    seed(&store, &rules).await?;
    println!("seeded {} policy rules", rules.len());
    Ok(())
}
