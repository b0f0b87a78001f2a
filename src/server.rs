//! Accept loop shared by the tracker and the seeder.
//!
//! Every accepted connection runs in its own task. When a task ends, its
//! result is pushed through a bounded channel that the accept loop drains
//! alongside new connections, so one slow or failing peer never holds up
//! the others.

use crate::error::SwarmResult;
use crate::metrics::ServerMetrics;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause after a failed `accept` before trying again.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Terminal result of one connection task.
#[derive(Debug)]
pub struct ConnectionOutcome {
    pub peer: SocketAddr,
    pub result: SwarmResult<()>,
}

/// Accept connections until `shutdown` fires.
///
/// `handler` is called once per connection; its future runs on its own task.
pub async fn serve<F, Fut>(
    role: &'static str,
    listener: TcpListener,
    outcome_capacity: usize,
    metrics: Arc<ServerMetrics>,
    shutdown: CancellationToken,
    handler: F,
) -> SwarmResult<()>
where
    F: Fn(TcpStream, SocketAddr) -> Fut,
    Fut: Future<Output = SwarmResult<()>> + Send + 'static,
{
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<ConnectionOutcome>(outcome_capacity.max(1));
    info!(operation = "listen", role = role, addr = ?listener.local_addr().ok());

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!(operation = "shutdown", role = role);
                break;
            }

            Some(outcome) = outcome_rx.recv() => {
                report(role, &metrics, outcome);
            }

            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        accept_backoff(role, &e, &shutdown).await;
                        continue;
                    }
                };

                metrics.record_connection();
                debug!(role = role, peer = %peer, "connection accepted");

                let task = handler(stream, peer);
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(async move {
                    let result = task.await;
                    // Receiver only goes away on shutdown
                    let _ = outcome_tx.send(ConnectionOutcome { peer, result }).await;
                });
            }
        }
    }

    metrics.log_summary(role);
    Ok(())
}

/// Log a failed `accept` and wait [`ACCEPT_BACKOFF`], or less if `shutdown`
/// fires first. Errors such as EMFILE persist across retries.
pub(crate) async fn accept_backoff(
    role: &str,
    error: &std::io::Error,
    shutdown: &CancellationToken,
) {
    warn!(role = role, error = %error, "failed to accept connection");
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
    }
}

fn report(role: &str, metrics: &ServerMetrics, outcome: ConnectionOutcome) {
    match outcome.result {
        Ok(()) => debug!(role = role, peer = %outcome.peer, "connection closed"),
        Err(e) => {
            metrics.record_connection_failure();
            warn!(role = role, peer = %outcome.peer, error = %e, "connection ended with error");
        }
    }
}
