//! Looks a torrent up on the tracker and downloads it from its seeders.

pub mod chunks;
pub mod coordinator;

pub use coordinator::{ChunkCoordinator, TransferReport};

use crate::config::Config;
use crate::error::{SwarmError, SwarmResult};
use crate::message::{SeederList, Torrent};
use crate::rpc;
use crate::storage::SharedStorage;
use tokio::net::TcpStream;
use tracing::info;

/// Ask the tracker which seeders hold `torrent`.
pub async fn find_seeders(tracker_addr: &str, torrent: &Torrent) -> SwarmResult<SeederList> {
    let mut conn = TcpStream::connect(tracker_addr).await?;
    let list: SeederList = rpc::call(&mut conn, torrent).await?;
    info!(
        operation = "lookup",
        tracker = tracker_addr,
        torrent = %list.torrent,
        seeders = list.seeders.len(),
    );
    Ok(list)
}

/// Download the configured target into the configured output file.
pub async fn run(config: &Config, storage: SharedStorage) -> SwarmResult<TransferReport> {
    let target = config.client.target.to_torrent();
    let list = find_seeders(&config.tracker.addr(), &target).await?;
    if list.seeders.is_empty() {
        return Err(SwarmError::NoSeeders(target.to_string()));
    }

    let coordinator = ChunkCoordinator::new(
        storage,
        config.client.chunk_size,
        config.client.timeout(),
    );
    let report = coordinator
        .download(&target, &list.seeders, &config.client.output_file)
        .await?;

    info!(
        operation = "download",
        output = %config.client.output_file.display(),
        chunks = report.chunks,
        bytes = report.bytes,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "download verified"
    );
    Ok(report)
}
