//! Server startup and binding
//!
//! Provides functionality to start the Axum server with configurable host/port
//! and graceful shutdown on Ctrl+C or SIGTERM.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;

use crate::client::RandomOrgClient;
use crate::config::{Credential, ServerConfig};
use crate::orchestrator::Orchestrator;
use crate::routes::{self, AppState};

/// Server instance that can be started
pub struct Server {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// The built router
    router: Router,
}

impl Server {
    /// Create a new server instance with the given configuration.
    ///
    /// `credential` is the provider key loaded at startup; `None` keeps the
    /// server up but answers every aggregation request with 401.
    pub fn new(config: ServerConfig, credential: Option<Credential>) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let client = RandomOrgClient::from_config(&config)?;
        let orchestrator = Orchestrator::new(Arc::new(client), credential)
            .with_in_flight_limit(config.in_flight_limit())
            .with_max_requests(config.max_requests);

        let state = AppState::new(config.clone(), Arc::new(orchestrator));
        let router = routes::build_router(state);

        Ok(Self { config, router })
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server
    ///
    /// Binds to the configured host/port and serves until a shutdown signal.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.run_with_listener(listener).await
    }

    /// Run the server with a specific listener
    ///
    /// This is useful for testing where you want to use a listener bound to port 0
    /// to get a random available port.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shut down");
        Ok(())
    }

    /// Create a test server and return the bound address
    ///
    /// This binds to port 0 to get a random available port, starts the server
    /// in a background task, and returns the actual bound address.
    #[cfg(test)]
    pub async fn spawn_test_server(
        config: ServerConfig,
        credential: Option<Credential>,
    ) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Self::new(config, credential).unwrap();
        let handle = tokio::spawn(async move {
            server.run_with_listener(listener).await.ok();
        });

        (addr, handle)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
