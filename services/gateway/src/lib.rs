//! Car-wash API gateway service library crate.
//!
//! # Purpose
//! Exposes configuration, storage backends, the identity-service client, and
//! the HTTP router with its authorization middleware for use by the binaries
//! and tests.
pub mod api;
pub mod app;
pub mod config;
pub mod identity;
pub mod middleware;
pub mod observability;
pub mod store;
