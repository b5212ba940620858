//! Retrying write primitive.
//!
//! Drives a byte span fully into a backend, riding out transient
//! non-blocking errors. Gives up after repeated hard failures and reports
//! how far it got; the caller decides what to do with the remainder.

use crate::backend::StorageBackend;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::warn;

/// Consecutive non-transient failures tolerated before giving up on a
/// chunk.
pub(crate) const MAX_WRITE_FAILURES: u32 = 3;

/// Pause inserted before retrying an incomplete attempt, so a persistently
/// failing device cannot pin a core in a tight loop.
const RETRY_DELAY: Duration = Duration::from_millis(1);

/// Write all of `data` to `backend`, retrying as needed.
///
/// `WouldBlock` and `Interrupted` are retried immediately and do not count
/// as failures. Any other error is logged and counted; after
/// [`MAX_WRITE_FAILURES`] consecutive failures the primitive stops and
/// returns the bytes written so far, which may be less than `data.len()`.
/// A successful partial write resets the failure count.
///
/// Returns `(bytes_written, hard_failures_seen)`.
pub fn write_retrying(backend: &mut dyn StorageBackend, data: &[u8]) -> (usize, u64) {
    let mut total = 0;
    let mut failures = 0u32;
    let mut failures_seen = 0u64;

    while total < data.len() {
        match backend.write(&data[total..]) {
            Ok(n) => {
                total += n;
                failures = 0;
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                // Transient: retry immediately, no backoff, no count.
                continue;
            }
            Err(e) => {
                failures += 1;
                failures_seen += 1;
                warn!(
                    target: "spool::io",
                    error = %e,
                    failures,
                    "write failed"
                );
                if failures >= MAX_WRITE_FAILURES {
                    break;
                }
            }
        }

        if total < data.len() {
            std::thread::sleep(RETRY_DELAY);
        }
    }

    (total, failures_seen)
}
