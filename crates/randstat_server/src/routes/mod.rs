//! Route modules for the randstat server
//!
//! This module contains endpoint group-specific routers:
//! - random: batch statistics over provider-generated integers
//! - health: Health check and readiness endpoints

pub mod health;
pub mod random;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::orchestrator::Orchestrator;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Request orchestrator, holding the upstream client and credential
    pub orchestrator: Arc<Orchestrator>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<ServerConfig>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(random::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
