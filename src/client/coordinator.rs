//! Parallel chunk download with a shared deadline and fail-fast cancellation.
//!
//! One task per chunk, no pooling. Every task reports exactly one outcome on
//! a shared channel. The first failure cancels the rest, but all outcomes
//! are still collected before the batch returns. Bytes already written stay
//! in the output file.

use crate::client::chunks;
use crate::error::{SwarmError, SwarmResult};
use crate::message::{ChunkRequest, ChunkResponse, Torrent};
use crate::metrics::TransferMetrics;
use crate::rpc;
use crate::storage::{run_blocking, SharedStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Terminal result of one chunk task.
#[derive(Debug)]
struct ChunkOutcome {
    index: usize,
    seeder: String,
    result: SwarmResult<u64>,
}

/// Summary of a verified download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub chunks: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

pub struct ChunkCoordinator {
    storage: SharedStorage,
    chunk_size: u64,
    timeout: Duration,
    metrics: Arc<TransferMetrics>,
}

impl ChunkCoordinator {
    pub fn new(storage: SharedStorage, chunk_size: u64, timeout: Duration) -> Self {
        Self {
            storage,
            chunk_size,
            timeout,
            metrics: Arc::new(TransferMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<TransferMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Fetch `target` from `seeders` into `output` and verify the result.
    ///
    /// Chunk `i` goes to `seeders[i % seeders.len()]`. Any chunk failure,
    /// or the deadline passing, fails the whole batch.
    pub async fn download(
        &self,
        target: &Torrent,
        seeders: &[String],
        output: &Path,
    ) -> SwarmResult<TransferReport> {
        if seeders.is_empty() {
            return Err(SwarmError::NoSeeders(target.to_string()));
        }

        let started = Instant::now();
        let deadline = started + self.timeout;
        let requests = chunks::split(&target.name, target.size, self.chunk_size)?;

        let storage = Arc::clone(&self.storage);
        let path = output.to_path_buf();
        let size = target.size;
        run_blocking(move || storage.create_preallocated(&path, size)).await?;

        info!(
            operation = "download_start",
            torrent = %target,
            chunks = requests.len(),
            seeders = seeders.len(),
            timeout_secs = self.timeout.as_secs_f64(),
        );

        let cancel = CancellationToken::new();
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<ChunkOutcome>(requests.len().max(1));
        let dispatched = requests.len();
        self.metrics.record_dispatch(dispatched as u64);

        for (index, request) in requests.into_iter().enumerate() {
            let Some(seeder) = chunks::assign(seeders, index) else {
                break;
            };
            let seeder = seeder.to_string();
            let worker = ChunkWorker {
                seeder: seeder.clone(),
                request,
                storage: Arc::clone(&self.storage),
                output: output.to_path_buf(),
            };
            let cancel = cancel.clone();
            let outcome_tx = outcome_tx.clone();
            let metrics = Arc::clone(&self.metrics);

            tokio::spawn(async move {
                let fetch_started = Instant::now();
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(SwarmError::Cancelled),
                    fetched = tokio::time::timeout_at(deadline, worker.run()) => {
                        fetched.unwrap_or_else(|_| {
                            Err(SwarmError::TimedOut(format!(
                                "chunk {} from {}",
                                index, seeder
                            )))
                        })
                    }
                };
                if let Ok(bytes) = &result {
                    metrics.record_chunk(*bytes, fetch_started.elapsed());
                }
                let _ = outcome_tx
                    .send(ChunkOutcome {
                        index,
                        seeder,
                        result,
                    })
                    .await;
            });
        }
        drop(outcome_tx);

        let mut failure: Option<SwarmError> = None;
        let mut bytes = 0u64;
        for _ in 0..dispatched {
            let Some(outcome) = outcome_rx.recv().await else {
                // Every sender is gone: some task ended without reporting
                failure.get_or_insert(SwarmError::Cancelled);
                break;
            };

            match outcome.result {
                Ok(n) => {
                    bytes += n;
                    debug!(chunk = outcome.index, seeder = %outcome.seeder, bytes = n, "chunk done");
                }
                Err(e) => {
                    self.metrics.record_failure();
                    if failure.is_none() {
                        warn!(
                            chunk = outcome.index,
                            seeder = %outcome.seeder,
                            error = %e,
                            "chunk failed, cancelling remaining chunks"
                        );
                        cancel.cancel();
                        failure = Some(e);
                    } else {
                        debug!(chunk = outcome.index, error = %e, "chunk ended after cancellation");
                    }
                }
            }
        }

        let elapsed = started.elapsed();
        self.metrics.log_summary(elapsed);

        if let Some(e) = failure {
            return Err(e);
        }

        verify(Arc::clone(&self.storage), output.to_path_buf(), target).await?;
        info!(
            operation = "download_complete",
            torrent = %target,
            output = %output.display(),
            elapsed_ms = elapsed.as_millis() as u64,
        );

        Ok(TransferReport {
            chunks: dispatched,
            bytes,
            elapsed,
        })
    }
}

struct ChunkWorker {
    seeder: String,
    request: ChunkRequest,
    storage: SharedStorage,
    output: PathBuf,
}

impl ChunkWorker {
    /// Fetch the chunk and write it at its offset. Returns bytes written.
    async fn run(&self) -> SwarmResult<u64> {
        let mut conn = TcpStream::connect(&self.seeder).await?;
        let response: ChunkResponse = rpc::call(&mut conn, &self.request).await?;
        let data = response.into_data(&self.request)?;
        let written = data.len() as u64;

        let storage = Arc::clone(&self.storage);
        let output = self.output.clone();
        let offset = self.request.offset;
        run_blocking(move || storage.write_at(&output, offset, &data)).await?;
        Ok(written)
    }
}

/// Compare the finished file against the torrent's declared size and digest.
async fn verify(storage: SharedStorage, output: PathBuf, target: &Torrent) -> SwarmResult<()> {
    let info = run_blocking(move || storage.file_info(&output)).await?;
    if info.size != target.size {
        return Err(SwarmError::Verification(format!(
            "size {} does not match declared {}",
            info.size, target.size
        )));
    }
    if info.content_hash != target.content_hash {
        return Err(SwarmError::Verification(format!(
            "digest {} does not match declared {}",
            info.content_hash, target.content_hash
        )));
    }
    Ok(())
}
