//! Gateway HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router: public system routes plus a gated router whose
//! every route runs behind [`authorize_request`].
use crate::api;
use crate::config::GatewayConfig;
use crate::identity::HttpIdentityService;
use crate::middleware::authorize_request;
use axum::Router;
use carwash_authz::{
    AuthorizationPipeline, IdentityVerifier, PolicyEngine, PolicyStore, TokenVerifier,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AuthorizationPipeline>,
    pub store: Arc<dyn PolicyStore>,
}

impl AppState {
    pub fn engine(&self) -> &Arc<PolicyEngine> {
        self.pipeline.engine()
    }
}

/// Wire the authorization pipeline from configuration and an opened store.
///
/// The initial policy load must succeed; a gateway that cannot read its
/// rules refuses to start.
pub async fn build_state(
    config: &GatewayConfig,
    store: Arc<dyn PolicyStore>,
) -> anyhow::Result<AppState> {
    let deadline = Duration::from_millis(config.request_deadline_ms);
    let tokens = TokenVerifier::new(config.access_token_secret.as_bytes())
        .with_leeway(config.token_leeway_secs);
    let identity = HttpIdentityService::new(&config.identity_url, deadline)?;
    let engine = PolicyEngine::load(store.clone()).await?;
    let pipeline = AuthorizationPipeline::new(
        tokens,
        IdentityVerifier::new(Arc::new(identity)),
        Arc::new(engine),
    )
    .with_reload_policy(config.policy_reload)
    .with_deadline(deadline);
    Ok(AppState {
        pipeline: Arc::new(pipeline),
        store,
    })
}

/// Compose the public routes with `gated`, which is wrapped by the
/// authorization middleware.
pub fn build_router(state: AppState, gated: Router<AppState>) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version()
            )
        });

    let gated = gated.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        authorize_request,
    ));

    Router::new()
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/openapi.json",
            axum::routing::get(api::openapi::openapi_json),
        )
        .merge(gated)
        .layer(trace_layer)
        .with_state(state)
}
