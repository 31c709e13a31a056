//! Axum middleware that runs the authorization pipeline in front of every
//! gated route.
//!
//! On success the verified [`AuthContext`](carwash_authz::AuthContext) is
//! inserted into the request extensions for downstream handlers.
use crate::api::error::{ApiError, api_rejection};
use crate::app::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use carwash_authz::AccessRequest;

pub async fn authorize_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let access = access_request(&request);
    let context = state
        .pipeline
        .authorize(&access)
        .await
        .map_err(|rejection| {
            let err = api_rejection(&rejection);
            metrics::counter!(
                "gateway_http_rejections_total",
                "status" => err.status.as_u16().to_string()
            )
            .increment(1);
            err
        })?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn access_request(request: &Request) -> AccessRequest {
    // Non-UTF-8 header bytes are kept (lossily) so they fail verification
    // instead of reading as a missing credential.
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    AccessRequest {
        authorization,
        path: request.uri().path().to_string(),
        method: request.method().as_str().to_string(),
    }
}
