//! HTTP Server
//!
//! Hosts the country redirect on every path, with an optional health endpoint.

use crate::config::Config;
use crate::redirect::CountryRouter;
use crate::shutdown::ShutdownCoordinator;
use crate::Result;
use anyhow::Context;
use axum::{routing::get, Router};
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// GeoRouter HTTP server
pub struct GeoRouterServer {
    config: Config,
    router: CountryRouter,
}

impl GeoRouterServer {
    /// Create a new server
    pub fn new(config: Config, router: CountryRouter) -> Self {
        Self { config, router }
    }

    /// Build the application router
    pub fn app(&self) -> Router {
        let mut app = Router::new();

        if let Some(path) = &self.config.server.health_path {
            app = app.route(path, get(health_check));
        }

        app.merge(self.router.clone().into_router())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until shutdown is triggered
    pub async fn start(self, shutdown: ShutdownCoordinator) -> Result<()> {
        let bind_addr = self.config.server.bind_addr;
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind GeoRouter server to {}", bind_addr))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownCoordinator) -> Result<()> {
        let local_addr: SocketAddr = listener.local_addr()?;
        info!("GeoRouter listening on {}", local_addr);
        info!("{} routing rules loaded", self.router.rules().len());

        let app = self.app();
        let graceful = shutdown.clone();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move { graceful.triggered().await })
            .into_future();

        let drain = async {
            shutdown.triggered().await;
            tokio::time::sleep(shutdown.timeout()).await;
        };

        tokio::select! {
            result = server => {
                result.context("GeoRouter server error")?;
                info!("GeoRouter server stopped");
            }
            _ = drain => {
                warn!(
                    "Requests still in flight after {:?}, stopping anyway",
                    shutdown.timeout()
                );
            }
        }

        Ok(())
    }
}

async fn health_check() -> &'static str {
    "ok"
}
