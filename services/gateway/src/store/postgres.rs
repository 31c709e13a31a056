//! Postgres-backed policy store.
//!
//! # Data model
//! One row per rule in `policy_rule`, keyed by `sequence`. Loads read
//! `ORDER BY sequence`, so the stored order is the evaluation order.
//!
//! # Consistency
//! `replace_rules` deletes and re-inserts inside one transaction. A failure at
//! any point drops the transaction, which rolls back and leaves the previous
//! rule set readable.
//!
//! # Security notes
//! - Database URLs may contain credentials; never log them.
use crate::config::PostgresConfig;
use anyhow::Context;
use async_trait::async_trait;
use carwash_authz::{Effect, PolicyError, PolicyResult, PolicyRule, PolicyStore};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

pub struct PostgresPolicyStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbPolicyRule {
    role: String,
    resource_pattern: String,
    action_pattern: String,
    effect: String,
}

impl DbPolicyRule {
    fn into_rule(self, index: usize) -> PolicyResult<PolicyRule> {
        let effect = Effect::from_str(&self.effect).map_err(|_| PolicyError::InvalidRule {
            index,
            reason: format!("unknown effect {:?}", self.effect),
        })?;
        Ok(PolicyRule {
            role: self.role,
            resource_pattern: self.resource_pattern,
            action_pattern: self.action_pattern,
            effect,
        })
    }
}

impl PostgresPolicyStore {
    /// Connect, then apply embedded migrations before returning.
    pub async fn connect(pg: &PostgresConfig) -> anyhow::Result<Self> {
        let store = Self::connect_without_migrations(pg).await?;
        sqlx::migrate!("./migrations")
            .run(&store.pool)
            .await
            .context("run policy store migrations")?;
        Ok(store)
    }

    /// Connect using an existing schema.
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> anyhow::Result<Self> {
        // `acquire_timeout` keeps a saturated pool from stalling the request
        // path past its deadline.
        let connect_options =
            PgConnectOptions::from_str(&pg.url).context("parse postgres url")?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await
            .context("connect to postgres")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyStore for PostgresPolicyStore {
    async fn load_rules(&self) -> PolicyResult<Vec<PolicyRule>> {
        let rows: Vec<DbPolicyRule> = sqlx::query_as(
            "SELECT role, resource_pattern, action_pattern, effect \
             FROM policy_rule ORDER BY sequence",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(PolicyError::unavailable)?;
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| row.into_rule(index))
            .collect()
    }

    async fn replace_rules(&self, rules: &[PolicyRule]) -> PolicyResult<()> {
        let mut tx = self.pool.begin().await.map_err(PolicyError::unavailable)?;
        sqlx::query("DELETE FROM policy_rule")
            .execute(&mut *tx)
            .await
            .map_err(PolicyError::unavailable)?;
        for (sequence, rule) in rules.iter().enumerate() {
            let sequence = i32::try_from(sequence).map_err(PolicyError::unavailable)?;
            sqlx::query(
                "INSERT INTO policy_rule (sequence, role, resource_pattern, action_pattern, effect) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(sequence)
            .bind(&rule.role)
            .bind(&rule.resource_pattern)
            .bind(&rule.action_pattern)
            .bind(rule.effect.as_str())
            .execute(&mut *tx)
            .await
            .map_err(PolicyError::unavailable)?;
        }
        tx.commit().await.map_err(PolicyError::unavailable)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> PolicyResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(PolicyError::unavailable)?;
        Ok(())
    }
}
