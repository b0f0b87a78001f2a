use crate::error::SwarmResult;
use crate::message::{Message, SeederList};
use crate::metrics::ServerMetrics;
use crate::tracker::registry::Registry;
use crate::wire;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Serve one tracker connection until the peer hangs up.
///
/// `TorrentList` registers a seeder and gets no reply. `Torrent` is a lookup
/// answered with a `SeederList`. Anything else is skipped.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: &str,
    registry: &Registry,
    metrics: &ServerMetrics,
) -> SwarmResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = match wire::decode(&mut stream).await {
            Ok(frame) => frame,
            Err(e) if e.is_clean_disconnect() => {
                debug!(peer = peer, "tracker peer disconnected");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        metrics.record_frame();

        let kind = frame.kind;
        let message = match frame.into_message() {
            Ok(message) => message,
            Err(e) => {
                warn!(peer = peer, kind = %kind, error = %e, "undecodable payload, skipping");
                metrics.record_skipped();
                continue;
            }
        };

        match message {
            Message::TorrentList(list) => {
                info!(
                    operation = "register",
                    seeder = %list.seeder_addr,
                    torrents = list.torrents.len(),
                );
                registry.register(list.seeder_addr, list.torrents);
                metrics.record_registration();
            }
            Message::Torrent(torrent) => {
                let seeders = registry.find_seeders(&torrent);
                info!(
                    operation = "lookup",
                    peer = peer,
                    torrent = %torrent,
                    seeders = seeders.len(),
                );
                let reply = wire::encode(&SeederList { torrent, seeders })?;
                wire::write_frame(&mut stream, &reply).await?;
                metrics.record_lookup();
            }
            Message::ChunkRequest(_) | Message::ChunkResponse(_) | Message::SeederList(_) => {
                debug!(peer = peer, kind = %kind, "no tracker handler for message, skipping");
                metrics.record_skipped();
            }
        }
    }
}
