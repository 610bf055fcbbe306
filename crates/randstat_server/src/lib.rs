//! REST API server for random batch statistics
//!
//! This crate exposes `GET /random/mean`, which fetches batches of random
//! integers from an upstream JSON-RPC provider concurrently and returns the
//! population standard deviation of each batch and of all batches combined.

pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod routes;
pub mod server;

// Re-export the statistics layer for integration
pub use randstat_core;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
