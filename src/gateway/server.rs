//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use super::dispatch::Dispatcher;
use super::router::{AppState, create_router};
use crate::backend::HttpCaBackend;
use crate::config::Config;
use crate::policy::ConfigPolicyStore;
use crate::{Error, Result};

/// Certgate server
pub struct Gateway {
    /// Configuration
    config: Config,
    /// Dispatch pipeline
    dispatcher: Arc<Dispatcher>,
}

impl Gateway {
    /// Create a new gateway.
    ///
    /// Policy store and backend client are built here, once; backend
    /// client construction failure is fatal rather than deferred to
    /// request time.
    pub fn new(config: Config) -> Result<Self> {
        let policies = Arc::new(ConfigPolicyStore::from_config(&config.policy));
        let backend = Arc::new(HttpCaBackend::from_config(&config.backend)?);
        let dispatcher = Arc::new(Dispatcher::new(policies, backend));

        Ok(Self { config, dispatcher })
    }

    /// Run the gateway until shutdown.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let state = Arc::new(AppState {
            dispatcher: Arc::clone(&self.dispatcher),
        });
        let app = create_router(state, self.config.server.max_body_size);

        let listener = TcpListener::bind(addr).await?;

        let mut operations: Vec<_> = self.dispatcher.registry().ids().collect();
        operations.sort_unstable();
        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            backend = %self.config.backend.url,
            "Listening"
        );
        info!(operations = ?operations, "Operation registry initialized");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway shutdown complete");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
