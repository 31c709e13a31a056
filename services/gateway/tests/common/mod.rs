#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Extension;
use axum::http::Request;
use axum::{Json, Router};
use carwash_authz::{
    AuthContext, AuthorizationPipeline, IdentityError, IdentityService, IdentityVerifier,
    PolicyEngine, PolicyError, PolicyResult, PolicyRule, PolicyStore, ReloadPolicy,
    SigningAlgorithm, TokenIssuer, TokenVerifier, default_rules,
};
use gateway::app::{AppState, build_router};
use gateway::store::memory::InMemoryPolicyStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

pub const SECRET: &[u8] = b"gateway-integration-secret";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn request(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::empty()).expect("request")
}

pub struct StubIdentity {
    active: HashSet<Uuid>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubIdentity {
    pub fn with_active(active: &[Uuid]) -> Self {
        Self {
            active: active.iter().copied().collect(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl IdentityService for StubIdentity {
    async fn validate_subject(&self, subject_id: Uuid) -> Result<(), IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.active.contains(&subject_id) {
            Ok(())
        } else {
            Err(IdentityError::NotFound)
        }
    }
}

/// In-memory store whose reads can be switched off to simulate an outage.
#[derive(Default)]
pub struct SwitchableStore {
    inner: InMemoryPolicyStore,
    down: AtomicBool,
    slow: AtomicBool,
    pub reads: AtomicUsize,
}

impl SwitchableStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_slow(&self, slow: bool) {
        self.slow.store(slow, Ordering::SeqCst);
    }
}

#[async_trait]
impl PolicyStore for SwitchableStore {
    async fn load_rules(&self) -> PolicyResult<Vec<PolicyRule>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(PolicyError::unavailable("connection refused"));
        }
        if self.slow.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        self.inner.load_rules().await
    }

    async fn replace_rules(&self, rules: &[PolicyRule]) -> PolicyResult<()> {
        self.inner.replace_rules(rules).await
    }

    fn backend_name(&self) -> &'static str {
        "switchable"
    }

    async fn health_check(&self) -> PolicyResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(PolicyError::unavailable("connection refused"));
        }
        Ok(())
    }
}

async fn echo(Extension(context): Extension<AuthContext>) -> Json<AuthContext> {
    Json(context)
}

pub fn upstream_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/car-wash/users/profile",
            axum::routing::get(echo).put(echo),
        )
        .route("/car-wash/providers", axum::routing::get(echo).post(echo))
        .route("/car-wash/bookings", axum::routing::get(echo).post(echo))
        .merge(gateway::api::session::routes())
}

pub struct TestGateway {
    pub app: Router,
    pub store: Arc<SwitchableStore>,
    pub identity: Arc<StubIdentity>,
    pub issuer: TokenIssuer,
}

impl TestGateway {
    pub fn bearer(&self, subject_id: &str, role: &str) -> String {
        format!("Bearer {}", self.issuer.mint(subject_id, role).expect("mint"))
    }
}

pub async fn test_gateway(
    identity: StubIdentity,
    reload: ReloadPolicy,
    deadline: Duration,
) -> TestGateway {
    let store = Arc::new(SwitchableStore::default());
    store
        .replace_rules(&default_rules())
        .await
        .expect("seed store");
    let identity = Arc::new(identity);
    let engine = PolicyEngine::load(store.clone()).await.expect("engine");
    let pipeline = AuthorizationPipeline::new(
        TokenVerifier::new(SECRET),
        IdentityVerifier::new(identity.clone()),
        Arc::new(engine),
    )
    .with_reload_policy(reload)
    .with_deadline(deadline);
    let state = AppState {
        pipeline: Arc::new(pipeline),
        store: store.clone(),
    };
    TestGateway {
        app: build_router(state, upstream_routes()),
        store,
        identity,
        issuer: TokenIssuer::new(SECRET, SigningAlgorithm::HS256, Duration::from_secs(300)),
    }
}
