//! Bearer token verification for gateway requests.
//!
//! Tokens are HMAC-signed JWTs issued by the auth service with the shared
//! access-token secret. The JOSE header is parsed by hand so that the signing
//! algorithm is checked against [`SigningAlgorithm`] before any key material
//! is touched; anything outside the HMAC family is refused outright.
use crate::{AuthError, AuthResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const BEARER_SCHEME: &str = "bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    pub const ALL: [SigningAlgorithm; 3] = [
        SigningAlgorithm::HS256,
        SigningAlgorithm::HS384,
        SigningAlgorithm::HS512,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }

    fn jwt_algorithm(self) -> Algorithm {
        match self {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SigningAlgorithm {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "HS256" => Ok(SigningAlgorithm::HS256),
            "HS384" => Ok(SigningAlgorithm::HS384),
            "HS512" => Ok(SigningAlgorithm::HS512),
            _ => Err(()),
        }
    }
}

/// Claims carried by gateway access tokens.
///
/// `subject_id` travels as the `user_id` claim, which is what the auth
/// service writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "user_id")]
    pub subject_id: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    /// Build typed claims from a signature-checked claim set.
    ///
    /// # Errors
    /// - `MalformedClaims` when `role` or `user_id` is absent or not a string.
    pub fn from_claim_set(claims: &Map<String, Value>) -> AuthResult<Self> {
        let role = string_claim(claims, "role")?;
        let subject_id = string_claim(claims, "user_id")?;
        Ok(Self {
            subject_id,
            role,
            exp: claims.get("exp").and_then(Value::as_i64),
            iat: claims.get("iat").and_then(Value::as_i64),
        })
    }
}

fn string_claim(claims: &Map<String, Value>, name: &str) -> AuthResult<String> {
    match claims.get(name) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(AuthError::MalformedClaims(format!(
            "{name} claim is not a string"
        ))),
        None => Err(AuthError::MalformedClaims(format!("{name} claim is missing"))),
    }
}

/// Verifies bearer tokens against the shared HMAC secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    algorithms: Vec<SigningAlgorithm>,
    leeway: u64,
}

impl TokenVerifier {
    pub fn new(shared_secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(shared_secret),
            algorithms: SigningAlgorithm::ALL.to_vec(),
            leeway: 0,
        }
    }

    /// Restrict accepted algorithms to a subset of the HMAC family.
    pub fn with_algorithms(mut self, algorithms: &[SigningAlgorithm]) -> Self {
        self.algorithms = algorithms.to_vec();
        self
    }

    /// Clock skew tolerated when checking `exp`, in seconds.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Verify a raw `Authorization` value and return its claims.
    ///
    /// The value may be a bare token or carry a `Bearer` scheme prefix.
    ///
    /// # Errors
    /// - `MissingCredential` for an empty value.
    /// - `UnsupportedAlgorithm` when the header names anything but an accepted HMAC algorithm.
    /// - `InvalidToken` for malformed tokens, bad signatures, or expired tokens.
    /// - `MalformedClaims` when a correctly signed token lacks `role` or `user_id`.
    pub fn verify(&self, raw_token: &str) -> AuthResult<Claims> {
        let token = strip_bearer(raw_token);
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let algorithm = header_algorithm(token)?;
        if !self.algorithms.contains(&algorithm) {
            return Err(AuthError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        let mut validation = Validation::new(algorithm.jwt_algorithm());
        // `exp` is enforced when present but tokens without it are accepted.
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.leeway = self.leeway;

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &validation)?;
        Claims::from_claim_set(&data.claims)
    }
}

/// Verify `raw_token` with `shared_secret`, accepting any HMAC algorithm and no leeway.
pub fn verify(raw_token: &str, shared_secret: &[u8]) -> AuthResult<Claims> {
    TokenVerifier::new(shared_secret).verify(raw_token)
}

// The scheme only counts as a whole word: `Bearer`, `Bearer <token>`, but not `Bearerxyz`.
fn strip_bearer(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.get(..BEARER_SCHEME.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => {
            let rest = &raw[BEARER_SCHEME.len()..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                raw
            }
        }
        _ => raw,
    }
}

fn header_algorithm(token: &str) -> AuthResult<SigningAlgorithm> {
    let encoded = token.split('.').next().unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|err| AuthError::InvalidToken(format!("header encoding: {err}")))?;
    let header: Value = serde_json::from_slice(&bytes)
        .map_err(|err| AuthError::InvalidToken(format!("header json: {err}")))?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::InvalidToken("header has no alg".to_string()))?;
    alg.parse()
        .map_err(|_| AuthError::UnsupportedAlgorithm(alg.to_string()))
}

/// Mints gateway tokens. The auth service owns issuance in production; this is
/// used by tests and local tooling that share the secret.
pub struct TokenIssuer {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(shared_secret: &[u8], algorithm: SigningAlgorithm, ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(shared_secret),
            ttl,
        }
    }

    pub fn mint(&self, subject_id: &str, role: &str) -> AuthResult<String> {
        let now = now_epoch_seconds();
        let claims = Claims {
            subject_id: subject_id.to_string(),
            role: role.to_string(),
            exp: Some(now.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX))),
            iat: Some(now),
        };
        let header = Header::new(self.algorithm.jwt_algorithm());
        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
