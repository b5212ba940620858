use spool_core::{DEFAULT_BUFFER_SIZE, DEFAULT_MIN_WRITE_SIZE};
use std::time::Duration;

/// Configuration for [`crate::SpoolWriter`].
#[derive(Debug, Clone)]
pub struct SpoolConfig {
    /// Ring buffer capacity in bytes. Usable space is one byte less.
    pub buffer_size: usize,
    /// Low watermark: the drain thread batches until at least this many
    /// bytes are buffered.
    pub min_write_size: usize,
    /// Interval between periodic durability syncs.
    pub sync_interval: Duration,
    /// Create the file if it does not exist.
    pub create: bool,
    /// Open in append mode instead of truncating.
    pub append: bool,
    /// Truncate an existing file on open. Ignored when `append` is set.
    pub truncate: bool,
    /// Unix permission bits applied when the file is created.
    pub mode: u32,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            min_write_size: DEFAULT_MIN_WRITE_SIZE,
            sync_interval: Duration::from_secs(1),
            create: true,
            append: false,
            truncate: true,
            mode: 0o644,
        }
    }
}

impl SpoolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    #[must_use]
    pub fn with_min_write_size(mut self, size: usize) -> Self {
        self.min_write_size = size;
        self
    }

    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use]
    pub fn with_truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    #[must_use]
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpoolConfig::default();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.min_write_size, DEFAULT_MIN_WRITE_SIZE);
        assert!(config.create);
        assert!(!config.append);
    }

    #[test]
    fn test_builder_chain() {
        let config = SpoolConfig::new()
            .with_buffer_size(8192)
            .with_min_write_size(4096)
            .with_append(true)
            .with_mode(0o600);
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.min_write_size, 4096);
        assert!(config.append);
        assert_eq!(config.mode, 0o600);
    }
}
