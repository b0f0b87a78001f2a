use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, trace};

/// Counters for a tracker or seeder process
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Connections accepted
    pub connections_accepted: AtomicU64,
    /// Connections that ended with an error
    pub connections_failed: AtomicU64,
    /// Frames decoded successfully
    pub frames_received: AtomicU64,
    /// Frames ignored (unsupported kind or undecodable body)
    pub frames_skipped: AtomicU64,
    /// Seeder registrations applied (tracker)
    pub registrations: AtomicU64,
    /// Seeder lookups answered (tracker)
    pub lookups: AtomicU64,
    /// Chunk responses sent (seeder)
    pub chunks_served: AtomicU64,
    /// Chunk requests answered with a storage error (seeder)
    pub storage_errors: AtomicU64,
    /// Payload bytes sent in chunk responses (seeder)
    pub bytes_served: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_failure(&self) {
        self.connections_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
        trace!(server_op = "skip");
    }

    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_served(&self, bytes: u64) {
        self.chunks_served.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_summary(&self, role: &str) {
        info!(
            operation = "server_metrics_summary",
            role = role,
            connections = self.connections_accepted.load(Ordering::Relaxed),
            connections_failed = self.connections_failed.load(Ordering::Relaxed),
            frames = self.frames_received.load(Ordering::Relaxed),
            skipped = self.frames_skipped.load(Ordering::Relaxed),
            registrations = self.registrations.load(Ordering::Relaxed),
            lookups = self.lookups.load(Ordering::Relaxed),
            chunks_served = self.chunks_served.load(Ordering::Relaxed),
            storage_errors = self.storage_errors.load(Ordering::Relaxed),
            bytes_served = self.bytes_served.load(Ordering::Relaxed),
        );
    }
}

/// Counters for one client download batch
#[derive(Debug, Default)]
pub struct TransferMetrics {
    pub chunks_dispatched: AtomicU64,
    pub chunks_completed: AtomicU64,
    pub chunks_failed: AtomicU64,
    pub bytes_received: AtomicU64,
    /// Total time spent in successful chunk fetches (nanoseconds)
    pub fetch_latency_ns: AtomicU64,
}

impl TransferMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self, chunks: u64) {
        self.chunks_dispatched.fetch_add(chunks, Ordering::Relaxed);
    }

    pub fn record_chunk(&self, bytes: u64, latency: Duration) {
        self.chunks_completed.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        self.fetch_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        trace!(
            transfer_op = "chunk",
            bytes = bytes,
            latency_ms = latency.as_millis() as u64
        );
    }

    pub fn record_failure(&self) {
        self.chunks_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Average successful fetch latency in milliseconds
    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.chunks_completed.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total_ns = self.fetch_latency_ns.load(Ordering::Relaxed);
        (total_ns as f64 / count as f64) / 1_000_000.0
    }

    /// Throughput in MB/s over `elapsed`
    pub fn throughput_mbps(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        let bytes = self.bytes_received.load(Ordering::Relaxed);
        (bytes as f64 / 1_048_576.0) / secs
    }

    pub fn log_summary(&self, elapsed: Duration) {
        info!(
            operation = "transfer_metrics_summary",
            dispatched = self.chunks_dispatched.load(Ordering::Relaxed),
            completed = self.chunks_completed.load(Ordering::Relaxed),
            failed = self.chunks_failed.load(Ordering::Relaxed),
            bytes = self.bytes_received.load(Ordering::Relaxed),
            avg_chunk_latency_ms = self.avg_latency_ms(),
            throughput_mbps = self.throughput_mbps(elapsed),
            duration_secs = elapsed.as_secs_f64(),
        );
    }
}
