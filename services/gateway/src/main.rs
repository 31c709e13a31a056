//! Car-wash API gateway entry point.
//!
//! Loads configuration, opens the policy store, wires the authorization
//! pipeline, and serves the gated router alongside the metrics listener.
use anyhow::Context;
use carwash_authz::{ReloadPolicy, spawn_policy_refresh};
use gateway::app::{build_router, build_state};
use gateway::config::GatewayConfig;
use gateway::{api, observability, store};
use std::future::Future;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env_or_yaml().context("gateway config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: GatewayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("carwash-gateway");
    tracing::info!(config = ?config, "starting gateway");
    let store = store::open_store(&config.storage).await?;
    let state = build_state(&config, store).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let refresh_task = match config.policy_reload {
        ReloadPolicy::Background => Some(spawn_policy_refresh(
            state.engine().clone(),
            Duration::from_millis(config.policy_reload_interval_ms),
        )),
        ReloadPolicy::PerRequest => None,
    };

    let app = build_router(state, api::session::routes());
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "gateway listening");
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    if let Some(task) = refresh_task {
        task.abort();
        let _ = task.await;
    }
    Ok(())
}
