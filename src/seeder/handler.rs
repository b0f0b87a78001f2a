use crate::config::MAX_CHUNK_SIZE;
use crate::error::{SwarmError, SwarmResult};
use crate::message::{ChunkRequest, ChunkResponse, MessageKind};
use crate::metrics::ServerMetrics;
use crate::storage::{run_blocking, SharedStorage};
use crate::wire;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

/// Serve chunk requests on one connection until the peer hangs up.
///
/// Storage failures are reported inside the response and never close the
/// connection. Undecodable requests and other message kinds are skipped.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: &str,
    storage: SharedStorage,
    root: &Path,
    metrics: &ServerMetrics,
) -> SwarmResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = match wire::decode(&mut stream).await {
            Ok(frame) => frame,
            Err(e) if e.is_clean_disconnect() => {
                debug!(peer = peer, "seeder peer disconnected");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        metrics.record_frame();

        if frame.kind != MessageKind::ChunkRequest {
            debug!(peer = peer, kind = %frame.kind, "ignoring request");
            metrics.record_skipped();
            continue;
        }

        let request: ChunkRequest = match frame.parse() {
            Ok(request) => request,
            Err(e) => {
                warn!(peer = peer, error = %e, "error decoding chunk request");
                metrics.record_skipped();
                continue;
            }
        };
        trace!(
            peer = peer,
            file = %request.file_name,
            offset = request.offset,
            size = request.size,
            "chunk request"
        );

        let response = serve_chunk(Arc::clone(&storage), root, request).await;
        match &response.error {
            Some(error) => {
                metrics.record_storage_error();
                warn!(peer = peer, error = %error, "chunk request failed");
            }
            None => metrics.record_chunk_served(response.data.len() as u64),
        }

        let frame = wire::encode(&response)?;
        wire::write_frame(&mut stream, &frame).await?;
    }
}

/// Read the requested range, turning any failure into a response error.
pub async fn serve_chunk(
    storage: SharedStorage,
    root: &Path,
    request: ChunkRequest,
) -> ChunkResponse {
    match read_chunk(storage, root, &request).await {
        Ok(data) => ChunkResponse::ok(request, data),
        Err(e) => ChunkResponse::failed(request, e.to_string()),
    }
}

async fn read_chunk(
    storage: SharedStorage,
    root: &Path,
    request: &ChunkRequest,
) -> SwarmResult<Vec<u8>> {
    if request.size > MAX_CHUNK_SIZE {
        return Err(SwarmError::InvalidArgument(format!(
            "requested {} bytes, limit is {}",
            request.size, MAX_CHUNK_SIZE
        )));
    }
    if request.end().is_none() {
        return Err(SwarmError::InvalidArgument(format!(
            "range at offset {} of {} bytes overflows",
            request.offset, request.size
        )));
    }
    let path = resolve(root, &request.file_name)?;
    let (offset, size) = (request.offset, request.size);
    run_blocking(move || storage.read_at(&path, offset, size)).await
}

/// Join a requested name onto the seeder root, allowing only a bare file name.
fn resolve(root: &Path, file_name: &str) -> SwarmResult<PathBuf> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(root.join(name)),
        _ => Err(SwarmError::InvalidArgument(format!(
            "invalid file name {:?}",
            file_name
        ))),
    }
}
