//! Routes served behind the authorization gate by the gateway itself.
use crate::api::types::SessionInfo;
use crate::app::AppState;
use axum::extract::Extension;
use axum::{Json, Router};
use carwash_authz::AuthContext;

#[utoipa::path(
    get,
    path = "/car-wash/session",
    tag = "session",
    responses(
        (status = 200, description = "Identity attached by the gateway", body = SessionInfo),
        (status = 401, description = "Missing or invalid credentials", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Role may not access this route", body = crate::api::types::ErrorResponse)
    )
)]
/// Echo the caller's verified identity.
pub(crate) async fn current_session(Extension(context): Extension<AuthContext>) -> Json<SessionInfo> {
    Json(context.into())
}

/// Gated routes the gateway answers directly.
pub fn routes() -> Router<AppState> {
    Router::new().route("/car-wash/session", axum::routing::get(current_session))
}
