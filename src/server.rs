use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::post;
use axum::Router;
use log::{debug, info};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::provider::Connector;

/// The relay's HTTP server, not yet bound.
pub struct RelayServer {
    config: Config,
    connector: Arc<dyn Connector>,
}

impl RelayServer {
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            connector: self.connector.clone(),
        });

        Router::new()
            .route(
                "/send",
                post(handlers::send_email).fallback(handlers::method_not_allowed),
            )
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Binds the configured address and serves in a background task.
    pub async fn start(&self) -> anyhow::Result<RunningServer> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .with_context(|| format!("failed to bind {}:{}", self.config.host, self.config.port))?;
        let addr = listener.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let app = self.router();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await
        });

        debug!("Serving on {}", addr);
        Ok(RunningServer {
            addr,
            shutdown,
            task,
        })
    }
}

pub struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn stop(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(());
        self.task.await??;
        info!("Server on {} stopped", self.addr);
        Ok(())
    }
}
