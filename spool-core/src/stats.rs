//! Lock-free counters for the writer's hot paths.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the producer and the drain thread without taking
/// the buffer lock.
///
/// `bytes_dropped` counts payload bytes abandoned after repeated write
/// failures (see the writer's data-loss contract); a nonzero value means
/// the file on disk is missing data the producer handed over.
#[derive(Default)]
pub struct WriterStats {
    bytes_accepted: AtomicU64,
    bytes_written: AtomicU64,
    bytes_dropped: AtomicU64,
    write_errors: AtomicU64,
    producer_stalls: AtomicU64,
}

impl WriterStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self, n: u64) {
        self.bytes_accepted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_written(&self, n: u64) {
        self.bytes_written.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, n: u64) {
        self.bytes_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_stall(&self) {
        self.producer_stalls.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> WriterStatsSnapshot {
        WriterStatsSnapshot {
            bytes_accepted: self.bytes_accepted.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            producer_stalls: self.producer_stalls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`WriterStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterStatsSnapshot {
    /// Bytes the producer successfully copied into the ring.
    pub bytes_accepted: u64,
    /// Bytes handed to the OS by the drain thread.
    pub bytes_written: u64,
    /// Bytes abandoned after repeated non-transient write failures.
    pub bytes_dropped: u64,
    /// Non-transient write syscall failures observed.
    pub write_errors: u64,
    /// Times the producer blocked waiting for free buffer space.
    pub producer_stalls: u64,
}
