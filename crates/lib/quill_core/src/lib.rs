//! # quill_core
//!
//! Token authentication core for Quill: signed access tokens, expiry
//! decisions, principal resolution and the login/refresh flows built on
//! top of them.

pub mod accounts;
pub mod auth;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
