//! Serves byte ranges of the files in one directory.

pub mod catalog;
pub mod handler;

use crate::config::Config;
use crate::error::SwarmResult;
use crate::message::{Torrent, TorrentList};
use crate::metrics::ServerMetrics;
use crate::rpc;
use crate::server;
use crate::storage::SharedStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Seeder {
    storage: SharedStorage,
    root: Arc<PathBuf>,
    metrics: Arc<ServerMetrics>,
    outcome_capacity: usize,
}

impl Seeder {
    pub fn new(storage: SharedStorage, root: impl Into<PathBuf>, outcome_capacity: usize) -> Self {
        Self {
            storage,
            root: Arc::new(root.into()),
            metrics: Arc::new(ServerMetrics::new()),
            outcome_capacity,
        }
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Torrent identities of the files this seeder can serve.
    pub async fn catalog(&self) -> SwarmResult<Vec<Torrent>> {
        catalog::scan(Arc::clone(&self.storage), self.root.as_ref().clone()).await
    }

    /// Serve chunk requests on `listener` until `shutdown` fires.
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> SwarmResult<()> {
        let storage = Arc::clone(&self.storage);
        let root = Arc::clone(&self.root);
        let metrics = Arc::clone(&self.metrics);

        server::serve(
            "seeder",
            listener,
            self.outcome_capacity,
            Arc::clone(&self.metrics),
            shutdown,
            move |stream, peer| {
                let storage = Arc::clone(&storage);
                let root = Arc::clone(&root);
                let metrics = Arc::clone(&metrics);
                async move {
                    handler::handle_connection(
                        stream,
                        &peer.to_string(),
                        storage,
                        &root,
                        &metrics,
                    )
                    .await
                }
            },
        )
        .await
    }
}

/// Tell the tracker which torrents `seeder_addr` holds. No reply is expected.
pub async fn announce(
    tracker_addr: &str,
    seeder_addr: &str,
    torrents: Vec<Torrent>,
) -> SwarmResult<()> {
    let mut conn = TcpStream::connect(tracker_addr).await?;
    let list = TorrentList {
        seeder_addr: seeder_addr.to_string(),
        torrents,
    };
    rpc::send(&mut conn, &list).await?;
    info!(
        operation = "announce",
        tracker = tracker_addr,
        seeder = seeder_addr,
        torrents = list.torrents.len(),
    );
    Ok(())
}

/// Scan the input directory, register with the tracker, then serve until
/// `shutdown` fires. Failing to register is fatal.
pub async fn run(
    config: &Config,
    storage: SharedStorage,
    shutdown: CancellationToken,
) -> SwarmResult<()> {
    let listener = TcpListener::bind(config.seeder.addr()).await?;
    let advertised = match &config.seeder.advertise_addr {
        Some(addr) => addr.clone(),
        None => listener.local_addr()?.to_string(),
    };

    let seeder = Seeder::new(
        storage,
        config.seeder.input_dir.clone(),
        config.server.outcome_capacity,
    );
    let torrents = seeder.catalog().await?;
    info!(
        operation = "startup",
        role = "seeder",
        dir = %config.seeder.input_dir.display(),
        torrents = torrents.len(),
    );

    announce(&config.tracker.addr(), &advertised, torrents).await?;
    info!(addr = %advertised, "seeder registered, ready");

    seeder.serve(listener, shutdown).await
}
