//! Storage backend seam between the drain/sync threads and the OS.

use crate::config::SpoolConfig;
use spool_core::Result;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// The syscall-level surface the writer needs from its target.
///
/// Production code uses [`FileBackend`]; tests substitute fault-injecting
/// implementations to exercise the retry and abandonment paths.
pub trait StorageBackend: Send {
    /// Write some prefix of `data` at the current position, returning the
    /// number of bytes the OS accepted.
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize>;

    /// Push already-written data down to stable storage
    /// (`fdatasync`-equivalent).
    fn sync_data(&mut self) -> std::io::Result<()>;

    /// Reposition the write cursor. Only called with the buffer fully
    /// drained.
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64>;
}

/// [`StorageBackend`] over a plain file descriptor.
pub struct FileBackend {
    file: File,
}

impl FileBackend {
    /// Open or create the target file per the config's flags and mode.
    ///
    /// # Errors
    /// Returns the underlying OS error (permission denied, missing parent,
    /// resource exhaustion). No retry is attempted.
    pub fn open(path: &Path, config: &SpoolConfig) -> Result<Self> {
        let mut opts = OpenOptions::new();
        opts.write(true).create(config.create);

        if config.append {
            opts.append(true);
        } else if config.truncate {
            opts.truncate(true);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(config.mode);
        }

        let file = opts.open(path)?;
        Ok(Self { file })
    }
}

impl StorageBackend for FileBackend {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.file.write(data)
    }

    fn sync_data(&mut self) -> std::io::Result<()> {
        self.file.sync_data()
    }

    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}
