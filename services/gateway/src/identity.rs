//! HTTP client for the identity service's subject validation endpoint.
//!
//! `GET {base}/v1/users/{id}/validate` answers 2xx for an active account and
//! 404 for an unknown or deactivated one. Every other outcome is a service
//! failure, which the pipeline reports as an unknown subject.
use async_trait::async_trait;
use carwash_authz::{IdentityError, IdentityService};
use reqwest::StatusCode;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct HttpIdentityService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdentityService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn validate_subject(&self, subject_id: Uuid) -> Result<(), IdentityError> {
        let url = format!("{}/v1/users/{}/validate", self.base_url, subject_id);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| IdentityError::Service(err.to_string()))?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound),
            status => Err(IdentityError::Service(format!(
                "unexpected status {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use std::net::SocketAddr;

    const ACTIVE: &str = "2f1d5c1e-8a5b-4c43-9f53-3c1c1b8a6f10";
    const BROKEN: &str = "9b7c8f61-0c7d-4f0e-8d55-1f3a3b5d9e22";

    async fn validate(Path(id): Path<String>) -> AxumStatus {
        match id.as_str() {
            ACTIVE => AxumStatus::NO_CONTENT,
            BROKEN => AxumStatus::INTERNAL_SERVER_ERROR,
            _ => AxumStatus::NOT_FOUND,
        }
    }

    async fn spawn_identity_server() -> SocketAddr {
        let app = Router::new().route("/v1/users/:id/validate", get(validate));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
        addr
    }

    fn client(addr: SocketAddr) -> HttpIdentityService {
        HttpIdentityService::new(&format!("http://{addr}/"), Duration::from_secs(1))
            .expect("client")
    }

    #[tokio::test]
    async fn active_subject_is_accepted() {
        let service = client(spawn_identity_server().await);
        service
            .validate_subject(ACTIVE.parse().unwrap())
            .await
            .expect("active");
    }

    #[tokio::test]
    async fn missing_subject_maps_to_not_found() {
        let service = client(spawn_identity_server().await);
        let err = service
            .validate_subject(Uuid::new_v4())
            .await
            .expect_err("unknown");
        assert!(matches!(err, IdentityError::NotFound));
    }

    #[tokio::test]
    async fn server_errors_map_to_service_failures() {
        let service = client(spawn_identity_server().await);
        let err = service
            .validate_subject(BROKEN.parse().unwrap())
            .await
            .expect_err("broken");
        assert!(matches!(err, IdentityError::Service(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_service_failure() {
        let service = HttpIdentityService::new("http://127.0.0.1:1", Duration::from_millis(500))
            .expect("client");
        let err = service
            .validate_subject(Uuid::new_v4())
            .await
            .expect_err("unreachable");
        assert!(matches!(err, IdentityError::Service(_)));
    }
}
