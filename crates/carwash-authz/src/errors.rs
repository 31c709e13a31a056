use thiserror::Error;

/// Credential and identity failures. Every variant maps to HTTP 401 at the edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is required")]
    MissingCredential,
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("malformed claims: {0}")]
    MalformedClaims(String),
    #[error("invalid subject id: {0}")]
    InvalidSubjectFormat(String),
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
}

impl AuthError {
    /// Stable taxonomy label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::MalformedClaims(_) => "malformed_claims",
            AuthError::InvalidSubjectFormat(_) => "invalid_subject_format",
            AuthError::UnknownSubject(_) => "unknown_subject",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("policy store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid policy rule at position {index}: {reason}")]
    InvalidRule { index: usize, reason: String },
}

impl PolicyError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        PolicyError::Unavailable(err.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PolicyError::Unavailable(_) => "policy_unavailable",
            PolicyError::InvalidRule { .. } => "invalid_rule",
        }
    }
}

pub type PolicyResult<T> = Result<T, PolicyError>;
