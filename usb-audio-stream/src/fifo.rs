//! Bounded first-word-fall-through queue of tagged bytes.
//!
//! [`TaggedFifo`] sits between the encoder feeder (sole writer) and the
//! encoder drainer (sole reader). Both sides are stepped by the same owner on
//! the same tick, so unlike a cross-context ring buffer it needs no atomics:
//! exclusive `&mut` access is the whole synchronization story.
//!
//! ## Semantics
//!
//! - **First-word-fall-through:** [`head()`](TaggedFifo::head) shows the oldest
//!   entry as soon as the queue is non-empty, without a prior read.
//! - **Occupancy:** [`level()`](TaggedFifo::level) is exact; there is no slot
//!   reserved for full/empty disambiguation.
//! - **Depth:** fixed at construction and never larger than the storage `N`.

use crate::error::ConfigError;
use crate::stream::WireByte;

/// Fixed-capacity ring buffer of [`WireByte`]s.
///
/// # Type Parameters
///
/// - `N`: Storage slots. The usable depth is chosen at construction, `≤ N`.
pub struct TaggedFifo<const N: usize> {
    buffer: [WireByte; N],
    depth: usize,
    /// Index of the head entry.
    read: usize,
    /// Number of stored entries.
    level: usize,
}

impl<const N: usize> TaggedFifo<N> {
    /// Create an empty queue using all `N` slots.
    pub const fn new() -> Self {
        TaggedFifo {
            buffer: [WireByte::new(0, 0); N],
            depth: N,
            read: 0,
            level: 0,
        }
    }

    /// Create an empty queue limited to `depth` entries.
    pub fn with_depth(depth: usize) -> Result<Self, ConfigError> {
        if depth == 0 {
            return Err(ConfigError::FifoDepthTooSmall { depth, required: 1 });
        }
        if depth > N {
            return Err(ConfigError::FifoStorageTooSmall { depth, storage: N });
        }
        let mut fifo = Self::new();
        fifo.depth = depth;
        Ok(fifo)
    }

    /// Maximum number of entries.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Current number of entries.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Free entries.
    pub fn headroom(&self) -> usize {
        self.depth - self.level
    }

    /// Write side can accept an entry.
    pub fn w_rdy(&self) -> bool {
        self.level < self.depth
    }

    /// Read side has an entry.
    pub fn r_rdy(&self) -> bool {
        self.level > 0
    }

    pub fn is_empty(&self) -> bool {
        self.level == 0
    }

    pub fn is_full(&self) -> bool {
        self.level == self.depth
    }

    /// The oldest entry, visible without consuming it.
    pub fn head(&self) -> Option<WireByte> {
        if self.level == 0 {
            None
        } else {
            Some(self.buffer[self.read])
        }
    }

    /// Append an entry.
    ///
    /// Returns `Err(byte)` if the queue is full.
    pub fn push(&mut self, byte: WireByte) -> Result<(), WireByte> {
        if self.is_full() {
            return Err(byte);
        }
        let write = (self.read + self.level) % self.depth;
        self.buffer[write] = byte;
        self.level += 1;
        Ok(())
    }

    /// Remove and return the head entry, or `None` if empty.
    pub fn pop(&mut self) -> Option<WireByte> {
        let byte = self.head()?;
        self.read = (self.read + 1) % self.depth;
        self.level -= 1;
        Some(byte)
    }

    /// Entries from head to tail, without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = WireByte> + '_ {
        (0..self.level).map(move |i| self.buffer[(self.read + i) % self.depth])
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.read = 0;
        self.level = 0;
    }
}

impl<const N: usize> Default for TaggedFifo<N> {
    fn default() -> Self {
        Self::new()
    }
}
