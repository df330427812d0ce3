//! Marketplace service binary support: HTTP API and application wiring.

pub mod api;
pub mod state;
