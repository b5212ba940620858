//! Fixed-capacity byte ring buffer with independent read/write cursors.
//!
//! One slot is permanently reserved so that "empty" (`rpos == wpos`) and
//! "full" never coincide: the usable capacity is `capacity - 1` bytes and
//! `used + free == capacity - 1` holds in every reachable state.

/// Circular byte store backing the spool writer.
///
/// The producer copies payloads in at the write cursor and the drain thread
/// copies chunks out at the read cursor. Neither cursor ever passes the
/// other; cursor updates are the caller's responsibility to serialize
/// (the writer keeps the whole ring behind one mutex).
pub struct RingBuffer {
    buf: Box<[u8]>,
    rpos: usize,
    wpos: usize,
}

impl RingBuffer {
    /// Create a ring with `capacity` bytes of storage (`capacity - 1`
    /// usable). Capacities below 2 are rounded up to 2.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(2)].into_boxed_slice(),
            rpos: 0,
            wpos: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently buffered and not yet consumed.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        if self.wpos >= self.rpos {
            self.wpos - self.rpos
        } else {
            self.buf.len() - self.rpos + self.wpos
        }
    }

    /// Bytes that can be pushed without overwriting unconsumed data.
    #[inline]
    #[must_use]
    pub fn free(&self) -> usize {
        self.buf.len() - self.used() - 1
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rpos == self.wpos
    }

    /// Copy `data` in at the write cursor and advance it. Splits into two
    /// contiguous copies when the span wraps past the end of storage.
    ///
    /// The caller must have verified `data.len() <= free()` under the same
    /// lock that serializes cursor access.
    pub fn push(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= self.free());
        let cap = self.buf.len();
        let first = data.len().min(cap - self.wpos);
        self.buf[self.wpos..self.wpos + first].copy_from_slice(&data[..first]);
        self.buf[..data.len() - first].copy_from_slice(&data[first..]);
        self.wpos = (self.wpos + data.len()) % cap;
    }

    /// Copy up to `out.len()` buffered bytes out at the read cursor
    /// without consuming them. Returns the number of bytes copied.
    #[must_use]
    pub fn peek(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.used());
        let cap = self.buf.len();
        let first = n.min(cap - self.rpos);
        out[..first].copy_from_slice(&self.buf[self.rpos..self.rpos + first]);
        out[first..n].copy_from_slice(&self.buf[..n - first]);
        n
    }

    /// Consume `n` bytes by advancing the read cursor. `n` must not exceed
    /// `used()`.
    pub fn advance_read(&mut self, n: usize) {
        debug_assert!(n <= self.used());
        self.rpos = (self.rpos + n) % self.buf.len();
    }
}
