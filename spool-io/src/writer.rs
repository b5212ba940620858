//! Double-buffered threaded disk writer.
//!
//! A producer hands bytes to [`SpoolWriter::write`], which copies them into
//! a fixed-capacity ring buffer and returns quickly. A dedicated drain
//! thread pushes buffered bytes to the file with a watermark-driven
//! batching policy, and a sync thread periodically asks the OS to move
//! already-submitted data to stable storage. The producer only blocks when
//! the ring is full, and then only until the drain thread frees space.

use crate::backend::{FileBackend, StorageBackend};
use crate::config::SpoolConfig;
use crate::retry::write_retrying;
use spool_core::{Result, RingBuffer, SpoolError, WriterStats, WriterStatsSnapshot, MAX_WRITE_SIZE};
use std::io::SeekFrom;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Quantum for every bounded wait; all predicates are re-checked in a loop
/// after each wakeup, so a missed signal costs at most one quantum.
const WAIT_QUANTUM: Duration = Duration::from_millis(100);

/// How long a flush waits before logging that it is still in progress.
const FLUSH_WARN_INTERVAL: Duration = Duration::from_secs(2);

/// Cursor and flag state guarded by the single writer lock.
struct WriterState {
    ring: RingBuffer,
    min_write_size: usize,
    /// Terminal: the producer side refuses new bytes.
    no_writes: bool,
    /// Transient: the drain thread ignores the low watermark.
    flush_requested: bool,
    /// Terminal: both background threads exit once their invariant holds.
    shutting_down: bool,
}

struct Shared {
    state: Mutex<WriterState>,
    /// Producer -> drain: bytes were pushed.
    data_available: Condvar,
    /// Drain -> producer: the read cursor advanced.
    space_freed: Condvar,
    /// Drain -> flush waiters: used count hit zero.
    buffer_empty: Condvar,
    /// Facade/teardown -> sync thread.
    sync_wake: Condvar,
    /// `None` once the writer is closed.
    backend: Mutex<Option<Box<dyn StorageBackend>>>,
    stats: WriterStats,
    sync_interval: Duration,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_backend(&self) -> MutexGuard<'_, Option<Box<dyn StorageBackend>>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_on<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, WriterState>,
        timeout: Duration,
    ) -> MutexGuard<'a, WriterState> {
        condvar
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }
}

/// Buffered writer for a single file, drained by background threads.
///
/// # Threading
///
/// At most one producer thread may call [`write`](Self::write) at a time;
/// concurrent producer calls are not supported. The control operations
/// (`flush`, `seek`, `sync`, reconfiguration, `close`) are expected from
/// the same thread.
///
/// # Data loss on persistent I/O failure
///
/// When a write syscall fails with a non-transient error three times in a
/// row, the current chunk is abandoned and its unwritten remainder is
/// dropped so the pipeline keeps moving. This trades durability for
/// liveness: for live-capture workloads, losing a chunk beats stalling the
/// producer indefinitely. The loss is logged at error level and surfaced
/// in [`stats`](Self::stats) as `bytes_dropped`; callers that prefer to
/// fail hard should watch that counter.
pub struct SpoolWriter {
    shared: Arc<Shared>,
    drain: Option<JoinHandle<()>>,
    syncer: Option<JoinHandle<()>>,
}

impl SpoolWriter {
    /// Open or create `path` and start the drain and sync threads.
    ///
    /// # Errors
    /// Returns the OS error if the file cannot be opened, or a thread
    /// error if a background thread cannot be spawned. Nothing is retried.
    pub fn open(path: impl AsRef<Path>, config: SpoolConfig) -> Result<Self> {
        let backend = FileBackend::open(path.as_ref(), &config)?;
        info!(
            target: "spool::io",
            path = %path.as_ref().display(),
            buffer_size = config.buffer_size,
            min_write_size = config.min_write_size,
            "Opened spool writer"
        );
        Self::with_backend(Box::new(backend), config)
    }

    /// Start a writer over an arbitrary [`StorageBackend`].
    ///
    /// This is the seam used by tests to inject failing or counting
    /// backends; production code goes through [`open`](Self::open).
    ///
    /// # Errors
    /// Returns [`SpoolError::Thread`] if a background thread cannot be
    /// spawned.
    pub fn with_backend(backend: Box<dyn StorageBackend>, config: SpoolConfig) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(WriterState {
                ring: RingBuffer::new(config.buffer_size),
                min_write_size: config.min_write_size,
                no_writes: false,
                flush_requested: false,
                shutting_down: false,
            }),
            data_available: Condvar::new(),
            space_freed: Condvar::new(),
            buffer_empty: Condvar::new(),
            sync_wake: Condvar::new(),
            backend: Mutex::new(Some(backend)),
            stats: WriterStats::new(),
            sync_interval: config.sync_interval,
        });

        let drain = {
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name("spool-drain".into())
                .spawn(move || drain_loop(&shared))
                .map_err(|e| SpoolError::Thread(format!("failed to spawn drain thread: {e}")))?
        };

        let syncer = {
            let shared_clone = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name("spool-sync".into())
                .spawn(move || sync_loop(&shared_clone));
            match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    // Unwind the drain thread before reporting failure.
                    shared.lock_state().shutting_down = true;
                    shared.data_available.notify_all();
                    let _ = drain.join();
                    return Err(SpoolError::Thread(format!(
                        "failed to spawn sync thread: {e}"
                    )));
                }
            }
        };

        Ok(Self {
            shared,
            drain: Some(drain),
            syncer: Some(syncer),
        })
    }

    /// Copy `data` into the ring buffer, returning the bytes accepted.
    ///
    /// Returns 0 immediately for empty input or once the writer refuses
    /// new bytes (closing or closed). When the ring is full the call
    /// blocks in bounded waits until the drain thread frees space;
    /// payloads larger than the ring are accepted piecewise as space
    /// appears. Never returns an error: disk trouble surfaces through the
    /// drain thread's logs and [`stats`](Self::stats).
    pub fn write(&self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }

        let mut state = self.shared.lock_state();
        if state.no_writes {
            return 0;
        }

        let mut accepted = 0;
        let mut stalled = false;

        while accepted < data.len() {
            if state.no_writes {
                break;
            }

            let free = state.ring.free();
            if free == 0 {
                if !stalled {
                    warn!(
                        target: "spool::io",
                        pending = data.len() - accepted,
                        "producer blocked: buffer full"
                    );
                    self.shared.stats.record_producer_stall();
                    stalled = true;
                }
                state = self
                    .shared
                    .wait_on(&self.shared.space_freed, state, WAIT_QUANTUM);
                continue;
            }

            let n = free.min(data.len() - accepted);
            state.ring.push(&data[accepted..accepted + n]);
            accepted += n;
            self.shared.data_available.notify_all();
        }

        drop(state);
        if stalled {
            warn!(target: "spool::io", accepted, "producer unblocked");
        }
        self.shared.stats.record_accepted(accepted as u64);
        accepted
    }

    /// Drain every buffered byte to the OS, blocking until the ring is
    /// empty. While a flush is pending the drain thread ignores the low
    /// watermark.
    pub fn flush(&self) {
        let mut state = self.shared.lock_state();
        state.flush_requested = true;
        self.shared.data_available.notify_all();

        while state.ring.used() > 0 {
            let used = state.ring.used();
            let (guard, timeout) = self
                .shared
                .buffer_empty
                .wait_timeout(state, FLUSH_WARN_INTERVAL)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
            if timeout.timed_out() && state.ring.used() > 0 {
                warn!(
                    target: "spool::io",
                    used,
                    remaining = state.ring.used(),
                    "flush taking a long time"
                );
            }
        }

        state.flush_requested = false;
    }

    /// Flush, then reposition the file cursor.
    ///
    /// Unsafe to call while another reader of the same file is active:
    /// draining does not pause such readers.
    ///
    /// # Errors
    /// Returns the OS error from the seek, or [`SpoolError::Closed`] after
    /// `close`.
    pub fn seek(&self, pos: SeekFrom) -> Result<u64> {
        self.flush();
        match self.shared.lock_backend().as_deref_mut() {
            Some(backend) => Ok(backend.seek(pos)?),
            None => Err(SpoolError::Closed),
        }
    }

    /// Ask the OS to push already-submitted data to stable storage.
    ///
    /// Fire-and-forget: does not touch buffered-but-unwritten bytes, and
    /// sync failures are logged rather than surfaced.
    pub fn sync(&self) {
        if let Some(backend) = self.shared.lock_backend().as_deref_mut() {
            if let Err(e) = backend.sync_data() {
                warn!(target: "spool::sync", error = %e, "durability sync failed");
            }
        }
    }

    /// Replace the ring buffer with one of `new_capacity` bytes.
    ///
    /// No-op when `new_capacity` is 0. Flushes first, so the swap happens
    /// with the buffer fully drained; both cursors reset to zero.
    pub fn set_buffer_size(&self, new_capacity: usize) {
        if new_capacity == 0 {
            return;
        }
        self.flush();
        let mut state = self.shared.lock_state();
        state.ring = RingBuffer::new(new_capacity);
        debug!(target: "spool::io", new_capacity, "ring buffer reallocated");
    }

    /// Update the low watermark used by the drain thread's batching
    /// policy. No-op when `new_min` is 0. Safe without draining: only
    /// future batching decisions are affected.
    pub fn set_min_write_size(&self, new_min: usize) {
        if new_min == 0 {
            return;
        }
        let mut state = self.shared.lock_state();
        state.min_write_size = new_min;
        self.shared.data_available.notify_all();
    }

    /// Bytes currently buffered and not yet handed to the OS.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.lock_state().ring.used()
    }

    /// Snapshot of the writer's counters.
    #[must_use]
    pub fn stats(&self) -> WriterStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Drain all accepted bytes, stop both background threads, and close
    /// the file. Idempotent; also run on drop.
    ///
    /// The ordering is load-bearing: refusing new writes and flushing
    /// before raising `shutting_down` guarantees no accepted byte is
    /// dropped, and the sync thread joins first because it never waits on
    /// buffer state.
    ///
    /// # Errors
    /// Returns [`SpoolError::Thread`] if a background thread panicked.
    pub fn close(&mut self) -> Result<()> {
        if self.drain.is_none() && self.syncer.is_none() {
            return Ok(());
        }

        self.shared.lock_state().no_writes = true;
        self.flush();
        self.shared.lock_state().shutting_down = true;

        self.shared.sync_wake.notify_all();
        if let Some(handle) = self.syncer.take() {
            handle
                .join()
                .map_err(|_| SpoolError::Thread("sync thread panicked".into()))?;
        }

        self.shared.data_available.notify_all();
        if let Some(handle) = self.drain.take() {
            handle
                .join()
                .map_err(|_| SpoolError::Thread("drain thread panicked".into()))?;
        }

        *self.shared.lock_backend() = None;
        info!(target: "spool::io", "Spool writer closed");
        Ok(())
    }
}

impl Drop for SpoolWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Body of the `spool-drain` thread.
///
/// Runs while the writer is live or bytes remain buffered. Each pass
/// copies the next chunk out of the ring under the lock, performs the
/// write syscall outside it, then advances the read cursor by the whole
/// attempted chunk: a short return from the retrying primitive means the
/// chunk was abandoned and its remainder is dropped, never retried.
fn drain_loop(shared: &Shared) {
    let mut scratch = vec![0u8; MAX_WRITE_SIZE];
    let mut state = shared.lock_state();

    loop {
        let used = state.ring.used();

        if used == 0 {
            shared.buffer_empty.notify_all();
            if state.shutting_down {
                break;
            }
            state = shared.wait_on(&shared.data_available, state, WAIT_QUANTUM);
            continue;
        }

        // Batching: below the low watermark, sit on the data so steady
        // small writes coalesce into fewer syscalls. A flush or shutdown
        // overrides, and the watermark is clamped to what the ring can
        // actually hold so a full buffer always makes progress.
        let min = state.min_write_size.min(state.ring.capacity() - 1);
        if !state.shutting_down && !state.flush_requested && used < min {
            state = shared.wait_on(&shared.data_available, state, WAIT_QUANTUM);
            continue;
        }

        let chunk = used.min(MAX_WRITE_SIZE);
        let n = state.ring.peek(&mut scratch[..chunk]);
        drop(state);

        let (written, failures) = match shared.lock_backend().as_deref_mut() {
            Some(backend) => write_retrying(backend, &scratch[..n]),
            None => (0, 0),
        };
        for _ in 0..failures {
            shared.stats.record_write_error();
        }
        shared.stats.record_written(written as u64);

        state = shared.lock_state();
        state.ring.advance_read(n);
        if written < n {
            let lost = n - written;
            shared.stats.record_dropped(lost as u64);
            error!(
                target: "spool::io",
                lost,
                "abandoning chunk after repeated write failures; bytes dropped"
            );
        }
        // Unconditional: a blocked producer re-checks free space even
        // after a failed write, so it can observe no_writes.
        shared.space_freed.notify_all();
    }
}

/// Body of the `spool-sync` thread.
///
/// Wakes on a fixed interval (or an explicit signal at teardown) and
/// issues one durability request. Never touches ring state.
fn sync_loop(shared: &Shared) {
    loop {
        let state = shared.lock_state();
        if state.shutting_down {
            break;
        }
        let state = shared.wait_on(&shared.sync_wake, state, shared.sync_interval);
        if state.shutting_down {
            break;
        }
        drop(state);

        if let Some(backend) = shared.lock_backend().as_deref_mut() {
            if let Err(e) = backend.sync_data() {
                debug!(target: "spool::sync", error = %e, "periodic sync failed");
            }
        }
    }
}
