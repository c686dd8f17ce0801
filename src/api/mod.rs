//! Reconciliation backend client.

/// The `Backend` trait and download targets.
pub mod backend;
/// reqwest-based implementation.
pub mod client;
/// Request and response bodies.
pub mod types;
/// Canned backend for tests.
#[cfg(test)]
pub mod fake;
