#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod backend;
mod config;
mod retry;
mod writer;

pub use backend::{FileBackend, StorageBackend};
pub use config::SpoolConfig;
pub use retry::write_retrying;
pub use writer::SpoolWriter;

pub use spool_core::{
    Result, SpoolError, WriterStatsSnapshot, DEFAULT_BUFFER_SIZE, DEFAULT_MIN_WRITE_SIZE,
    MAX_WRITE_SIZE,
};
