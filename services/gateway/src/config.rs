use anyhow::{Context, Result, bail};
use carwash_authz::{PolicyRule, ReloadPolicy, validate_rules};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_IDENTITY_URL: &str = "http://auth-service:8081";
pub const DEFAULT_TOKEN_LEEWAY_SECS: u64 = 5;
pub const DEFAULT_REQUEST_DEADLINE_MS: u64 = 2_000;
pub const DEFAULT_POLICY_RELOAD_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

// Connection URLs may embed credentials; keep them out of Debug output.
#[derive(Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub postgres: Option<PostgresConfig>,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        let backend = env_or("GATEWAY_STORAGE", "memory")
            .parse()
            .with_context(|| "parse GATEWAY_STORAGE")?;
        let postgres = match postgres_url_from_env() {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: parse_env(
                    "GATEWAY_POSTGRES_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                acquire_timeout_ms: parse_env(
                    "GATEWAY_POSTGRES_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            None => None,
        };
        let config = Self { backend, postgres };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::Postgres && self.postgres.is_none() {
            bail!("postgres storage selected but GATEWAY_POSTGRES_URL is not set");
        }
        Ok(())
    }
}

/// Gateway configuration sourced from environment variables, optionally
/// overridden by a YAML file named in `GATEWAY_CONFIG`.
#[derive(Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub access_token_secret: String,
    pub token_leeway_secs: u64,
    pub identity_url: String,
    pub request_deadline_ms: u64,
    pub policy_reload: ReloadPolicy,
    pub policy_reload_interval_ms: u64,
    pub storage: StorageConfig,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("metrics_bind", &self.metrics_bind)
            .field("access_token_secret", &"<redacted>")
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("identity_url", &self.identity_url)
            .field("request_deadline_ms", &self.request_deadline_ms)
            .field("policy_reload", &self.policy_reload)
            .field("policy_reload_interval_ms", &self.policy_reload_interval_ms)
            .field("storage", &self.storage)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GatewayConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    identity_url: Option<String>,
    token_leeway_secs: Option<u64>,
    request_deadline_ms: Option<u64>,
    policy_reload: Option<ReloadPolicy>,
    policy_reload_interval_ms: Option<u64>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("GATEWAY_BIND", DEFAULT_BIND)
            .parse()
            .with_context(|| "parse GATEWAY_BIND")?;
        let metrics_bind = env_or("GATEWAY_METRICS_BIND", DEFAULT_METRICS_BIND)
            .parse()
            .with_context(|| "parse GATEWAY_METRICS_BIND")?;
        // ACCESS_TOKEN is the name the rest of the platform uses for the shared secret.
        let access_token_secret = std::env::var("GATEWAY_ACCESS_TOKEN_SECRET")
            .or_else(|_| std::env::var("ACCESS_TOKEN"))
            .unwrap_or_default();
        let policy_reload = parse_reload_policy(&env_or("GATEWAY_POLICY_RELOAD", "per_request"))?;

        let config = Self {
            bind_addr,
            metrics_bind,
            access_token_secret,
            token_leeway_secs: parse_env("GATEWAY_TOKEN_LEEWAY_SECS", DEFAULT_TOKEN_LEEWAY_SECS)?,
            identity_url: env_or("GATEWAY_IDENTITY_URL", DEFAULT_IDENTITY_URL),
            request_deadline_ms: parse_env(
                "GATEWAY_REQUEST_DEADLINE_MS",
                DEFAULT_REQUEST_DEADLINE_MS,
            )?,
            policy_reload,
            policy_reload_interval_ms: parse_env(
                "GATEWAY_POLICY_RELOAD_INTERVAL_MS",
                DEFAULT_POLICY_RELOAD_INTERVAL_MS,
            )?,
            storage: StorageConfig::from_env()?,
        };
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GATEWAY_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GATEWAY_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: GatewayConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse gateway config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.identity_url {
            self.identity_url = value;
        }
        if let Some(value) = override_cfg.token_leeway_secs {
            self.token_leeway_secs = value;
        }
        if let Some(value) = override_cfg.request_deadline_ms {
            self.request_deadline_ms = value;
        }
        if let Some(value) = override_cfg.policy_reload {
            self.policy_reload = value;
        }
        if let Some(value) = override_cfg.policy_reload_interval_ms {
            self.policy_reload_interval_ms = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_token_secret.is_empty() {
            bail!("GATEWAY_ACCESS_TOKEN_SECRET must be set");
        }
        if self.request_deadline_ms == 0 {
            bail!("request_deadline_ms must be greater than zero");
        }
        if self.policy_reload == ReloadPolicy::Background && self.policy_reload_interval_ms == 0 {
            bail!("policy_reload_interval_ms must be greater than zero");
        }
        self.storage.validate()
    }
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    rules: Vec<PolicyRule>,
}

/// Parse an ordered rule list from YAML (`rules: [{role, resource_pattern, action_pattern, effect}]`).
pub fn parse_policy_yaml(contents: &str) -> Result<Vec<PolicyRule>> {
    let file: PolicyFile =
        serde_yaml::from_str(contents).with_context(|| "parse policy rules yaml")?;
    validate_rules(&file.rules)?;
    Ok(file.rules)
}

pub fn load_policy_file(path: &str) -> Result<Vec<PolicyRule>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read policy file: {path}"))?;
    parse_policy_yaml(&contents)
}

fn parse_reload_policy(value: &str) -> Result<ReloadPolicy> {
    match value {
        "per_request" => Ok(ReloadPolicy::PerRequest),
        "background" => Ok(ReloadPolicy::Background),
        other => bail!("unknown GATEWAY_POLICY_RELOAD value: {other}"),
    }
}

fn postgres_url_from_env() -> Option<String> {
    if let Ok(url) = std::env::var("GATEWAY_POSTGRES_URL") {
        return Some(url);
    }
    // Fall back to the DB_* variables shared with the other platform services.
    let host = std::env::var("DB_HOST").ok()?;
    let port = env_or("DB_PORT", "5432");
    let user = env_or("DB_USER", "postgres");
    let password = env_or("DB_PASSWORD", "");
    let name = env_or("DB_NAME", "postgres");
    Some(format!(
        "postgres://{user}:{password}@{host}:{port}/{name}?sslmode=disable"
    ))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}
