//! Directory service mapping seeders to the torrents they advertise.

pub mod diagnostics;
pub mod handler;
pub mod registry;

pub use registry::Registry;

use crate::config::Config;
use crate::error::SwarmResult;
use crate::metrics::ServerMetrics;
use crate::server;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Tracker {
    registry: Arc<Registry>,
    metrics: Arc<ServerMetrics>,
    outcome_capacity: usize,
}

impl Tracker {
    pub fn new(outcome_capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            metrics: Arc::new(ServerMetrics::new()),
            outcome_capacity,
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Serve protocol connections on `listener` until `shutdown` fires.
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> SwarmResult<()> {
        let registry = Arc::clone(&self.registry);
        let metrics = Arc::clone(&self.metrics);

        server::serve(
            "tracker",
            listener,
            self.outcome_capacity,
            Arc::clone(&self.metrics),
            shutdown,
            move |stream, peer| {
                let registry = Arc::clone(&registry);
                let metrics = Arc::clone(&metrics);
                async move {
                    handler::handle_connection(stream, &peer.to_string(), &registry, &metrics).await
                }
            },
        )
        .await
    }

    /// Serve the protocol port and the diagnostics port together.
    pub async fn serve_with_diagnostics(
        &self,
        listener: TcpListener,
        web_listener: TcpListener,
        shutdown: CancellationToken,
    ) -> SwarmResult<()> {
        tokio::try_join!(
            self.serve(listener, shutdown.clone()),
            diagnostics::serve(web_listener, self.registry(), shutdown),
        )?;
        Ok(())
    }
}

/// Bind the configured ports and run the tracker until `shutdown` fires.
pub async fn run(config: &Config, shutdown: CancellationToken) -> SwarmResult<()> {
    let listener = TcpListener::bind(config.tracker.addr()).await?;
    let web_listener = TcpListener::bind(config.tracker.web_addr()).await?;
    info!(
        operation = "startup",
        role = "tracker",
        addr = %config.tracker.addr(),
        web_addr = %config.tracker.web_addr(),
    );

    let tracker = Tracker::new(config.server.outcome_capacity);
    tracker
        .serve_with_diagnostics(listener, web_listener, shutdown)
        .await
}
