//! Request authorization primitives for the car-wash API gateway.
//!
//! # Purpose
//! Verifies bearer tokens, confirms the caller is a live account, and decides
//! whether the caller's role may perform a method on a path.
//!
//! # How it fits
//! The gateway service wires these pieces into an axum middleware and
//! supplies the concrete policy store and identity-service client.
//!
//! # Key invariants
//! - Tokens are HMAC-signed (HS256/HS384/HS512); every other algorithm is rejected.
//! - Policy evaluation is first match in rule order, default deny.
//! - Reloads publish a complete snapshot; decisions never see a half-loaded rule set.
//!
//! # Examples
//! ```rust
//! use carwash_authz::{PolicyRule, PolicySnapshot};
//!
//! let snapshot = PolicySnapshot::new(vec![PolicyRule::allow("admin", "/car-wash/*", "*")]);
//! assert!(snapshot.decide("admin", "/car-wash/providers", "POST"));
//! assert!(!snapshot.decide("guest", "/car-wash/providers", "POST"));
//! ```
//!
//! # Common pitfalls
//! - Rule order matters: a broad allow listed before a narrow deny wins.

mod engine;
mod errors;
mod identity;
mod matcher;
mod pipeline;
mod policy;
mod store;
mod token;

pub use engine::{PolicyEngine, spawn_policy_refresh};
pub use errors::{AuthError, AuthResult, PolicyError, PolicyResult};
pub use identity::{IdentityError, IdentityService, IdentityVerifier};
pub use matcher::{WILDCARD, action_matches, resource_matches};
pub use pipeline::{
    AccessRequest, AuthContext, AuthorizationPipeline, DEFAULT_REQUEST_DEADLINE, Rejection,
    ReloadPolicy,
};
pub use policy::{Decision, Effect, PolicyRule, PolicySnapshot, Role, default_rules, validate_rules};
pub use store::{PolicyStore, seed};
pub use token::{Claims, SigningAlgorithm, TokenIssuer, TokenVerifier, verify};
