//! Live subject validation against the identity service.
//!
//! # Key invariants
//! - Subject ids must be UUIDs; anything else is rejected locally.
//! - Every validation reaches the identity service; nothing is cached, so a
//!   deactivated account is refused on its next request.
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("subject not found")]
    NotFound,
    #[error("identity service error: {0}")]
    Service(String),
}

/// Remote `ValidateSubject` call.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn validate_subject(&self, subject_id: Uuid) -> Result<(), IdentityError>;
}

#[derive(Clone)]
pub struct IdentityVerifier {
    service: Arc<dyn IdentityService>,
}

impl IdentityVerifier {
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }

    /// Confirm `subject_id` names a known, active account.
    ///
    /// # Errors
    /// - `InvalidSubjectFormat` when `subject_id` is not a UUID (no remote call).
    /// - `UnknownSubject` when the service reports not-found or fails.
    pub async fn validate(&self, subject_id: &str) -> AuthResult<()> {
        let parsed = Uuid::parse_str(subject_id)
            .map_err(|_| AuthError::InvalidSubjectFormat(subject_id.to_string()))?;
        match self.service.validate_subject(parsed).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(%subject_id, error = %err, "identity lookup rejected subject");
                Err(AuthError::UnknownSubject(subject_id.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIdentity {
        active: HashSet<Uuid>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityService for CountingIdentity {
        async fn validate_subject(&self, subject_id: Uuid) -> Result<(), IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(IdentityError::Service("unavailable".to_string()));
            }
            if self.active.contains(&subject_id) {
                Ok(())
            } else {
                Err(IdentityError::NotFound)
            }
        }
    }

    fn identity(active: &[Uuid], fail: bool) -> Arc<CountingIdentity> {
        Arc::new(CountingIdentity {
            active: active.iter().copied().collect(),
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn malformed_subject_fails_without_remote_call() {
        let service = identity(&[], false);
        let verifier = IdentityVerifier::new(service.clone());
        let err = verifier.validate("not-a-uuid").await.expect_err("format");
        assert_eq!(err, AuthError::InvalidSubjectFormat("not-a-uuid".to_string()));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn active_subject_passes() {
        let subject = Uuid::new_v4();
        let service = identity(&[subject], false);
        let verifier = IdentityVerifier::new(service.clone());
        verifier
            .validate(&subject.to_string())
            .await
            .expect("active");
        verifier
            .validate(&subject.to_string())
            .await
            .expect("active again");
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_or_failing_lookups_fold_into_unknown_subject() {
        let subject = Uuid::new_v4();
        let verifier = IdentityVerifier::new(identity(&[], false));
        assert!(matches!(
            verifier.validate(&subject.to_string()).await,
            Err(AuthError::UnknownSubject(_))
        ));

        let verifier = IdentityVerifier::new(identity(&[subject], true));
        assert!(matches!(
            verifier.validate(&subject.to_string()).await,
            Err(AuthError::UnknownSubject(_))
        ));
    }
}
