//! Per-request authorization gate.
//!
//! # Purpose
//! Runs token verification, live identity validation, and the policy decision
//! in that order, stopping at the first failure.
//!
//! # Key invariants
//! - No step is retried; a rejection is final for the request.
//! - Identity lookups and per-request policy reloads share one deadline.
//! - Every rejection is logged with its taxonomy kind.
use crate::engine::PolicyEngine;
use crate::identity::IdentityVerifier;
use crate::token::TokenVerifier;
use crate::{AuthError, PolicyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, timeout_at};

pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(2);

/// When the engine re-reads the policy store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Reload before every decision, so store edits apply to the next request.
    PerRequest,
    /// Decide against the published snapshot; a background task refreshes it.
    Background,
}

#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub authorization: Option<String>,
    pub path: String,
    pub method: String,
}

/// Identity attached to an authorized request for downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub subject_id: String,
    pub role: String,
}

#[derive(Debug, Error)]
pub enum Rejection {
    #[error(transparent)]
    Unauthorized(AuthError),
    #[error("access denied: {role} cannot {action} {resource}")]
    Forbidden {
        role: String,
        action: String,
        resource: String,
    },
    #[error(transparent)]
    PolicyUnavailable(PolicyError),
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded { stage: &'static str },
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::Unauthorized(err) => err.kind(),
            Rejection::Forbidden { .. } => "forbidden",
            Rejection::PolicyUnavailable(err) => err.kind(),
            Rejection::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

pub struct AuthorizationPipeline {
    tokens: TokenVerifier,
    identity: IdentityVerifier,
    engine: Arc<PolicyEngine>,
    reload: ReloadPolicy,
    deadline: Duration,
}

impl AuthorizationPipeline {
    pub fn new(tokens: TokenVerifier, identity: IdentityVerifier, engine: Arc<PolicyEngine>) -> Self {
        Self {
            tokens,
            identity,
            engine,
            reload: ReloadPolicy::PerRequest,
            deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }

    pub fn with_reload_policy(mut self, reload: ReloadPolicy) -> Self {
        self.reload = reload;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    pub async fn authorize(&self, request: &AccessRequest) -> Result<AuthContext, Rejection> {
        let started = Instant::now();
        let result = self.run(request, started + self.deadline).await;
        metrics::histogram!("gateway_authz_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(context) => {
                metrics::counter!(
                    "gateway_authz_decisions_total",
                    "outcome" => "authorized",
                    "kind" => "allowed"
                )
                .increment(1);
                tracing::debug!(
                    subject_id = %context.subject_id,
                    role = %context.role,
                    method = %request.method,
                    path = %request.path,
                    "request authorized"
                );
            }
            Err(rejection) => {
                metrics::counter!(
                    "gateway_authz_decisions_total",
                    "outcome" => "rejected",
                    "kind" => rejection.kind()
                )
                .increment(1);
                tracing::warn!(
                    kind = rejection.kind(),
                    method = %request.method,
                    path = %request.path,
                    error = %rejection,
                    "request rejected"
                );
            }
        }
        result
    }

    async fn run(&self, request: &AccessRequest, deadline: Instant) -> Result<AuthContext, Rejection> {
        let raw = request.authorization.as_deref().unwrap_or_default();
        let claims = self.tokens.verify(raw).map_err(Rejection::Unauthorized)?;

        timeout_at(deadline, self.identity.validate(&claims.subject_id))
            .await
            .map_err(|_| Rejection::DeadlineExceeded { stage: "identity" })?
            .map_err(Rejection::Unauthorized)?;

        let snapshot = match self.reload {
            ReloadPolicy::PerRequest => timeout_at(deadline, self.engine.reload())
                .await
                .map_err(|_| Rejection::DeadlineExceeded {
                    stage: "policy_reload",
                })?
                .map_err(Rejection::PolicyUnavailable)?,
            ReloadPolicy::Background => self.engine.snapshot(),
        };

        let decision = snapshot.evaluate(&claims.role, &request.path, &request.method);
        if !decision.allowed {
            return Err(Rejection::Forbidden {
                role: claims.role,
                action: request.method.clone(),
                resource: request.path.clone(),
            });
        }

        Ok(AuthContext {
            subject_id: claims.subject_id,
            role: claims.role,
        })
    }
}
