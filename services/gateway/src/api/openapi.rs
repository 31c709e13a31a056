//! OpenAPI document for the gateway's own endpoints.
use crate::api::{
    session, system,
    types::{ErrorResponse, HealthStatus, SessionInfo},
};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "carwash-gateway",
        version = "v1",
        description = "Car-wash API gateway"
    ),
    paths(system::system_health, session::current_session),
    components(schemas(HealthStatus, ErrorResponse, SessionInfo))
)]
pub struct ApiDoc;

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
