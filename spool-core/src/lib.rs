#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod ring;
mod stats;

pub use error::{Result, SpoolError};
pub use ring::RingBuffer;
pub use stats::{WriterStats, WriterStatsSnapshot};

/// Default ring buffer capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024; // 2 MiB

/// Default low watermark: the drain thread batches writes until at least
/// this many bytes are buffered (unless flushing or shutting down).
pub const DEFAULT_MIN_WRITE_SIZE: usize = 64 * 1024; // 64 KiB

/// Hard cap on a single write submitted to the OS. Bounds worst-case
/// syscall latency so the producer is never starved for an unbounded
/// stretch while the drain thread is inside `write(2)`.
pub const MAX_WRITE_SIZE: usize = 256 * 1024; // 256 KiB
