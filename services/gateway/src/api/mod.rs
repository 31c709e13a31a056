//! Gateway HTTP API module.
pub mod error;
pub mod openapi;
pub mod session;
pub mod system;
pub mod types;
