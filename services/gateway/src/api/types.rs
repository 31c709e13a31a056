//! HTTP API request/response types.
use carwash_authz::AuthContext;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Identity the gateway attached to an authorized request.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub subject_id: String,
    pub role: String,
}

impl From<AuthContext> for SessionInfo {
    fn from(context: AuthContext) -> Self {
        Self {
            subject_id: context.subject_id,
            role: context.role,
        }
    }
}
