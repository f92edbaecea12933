//! Buffer handles and their lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

static NEXT_READER: AtomicU64 = AtomicU64::new(1);

/// Opaque name for one buffer segment issued by a
/// [`ZeroCopyReader`](super::ZeroCopyReader).
///
/// A handle names the reader that issued it and its position in that
/// reader's issue order, so a handle from one reader is never mistaken for
/// a handle of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId {
    reader: u64,
    seq: u64,
}

impl HandleId {
    /// Returns the id of the issuing reader.
    pub fn reader(self) -> u64 {
        self.reader
    }

    /// Returns the position of this handle in its reader's issue order.
    pub fn seq(self) -> u64 {
        self.seq
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.reader, self.seq)
    }
}

/// Hands out the handles of one reader.
///
/// Remembers only how many handles it issued, so a reader can tell a
/// released handle from a foreign one without keeping released entries.
#[derive(Debug)]
pub(crate) struct HandleIssuer {
    reader: u64,
    next_seq: u64,
}

impl HandleIssuer {
    pub(crate) fn new() -> Self {
        Self {
            reader: NEXT_READER.fetch_add(1, Ordering::Relaxed),
            next_seq: 0,
        }
    }

    pub(crate) fn issue(&mut self) -> HandleId {
        let handle = HandleId {
            reader: self.reader,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        handle
    }

    /// Returns true if this issuer ever handed out `handle`.
    pub(crate) fn issued(&self, handle: HandleId) -> bool {
        handle.reader == self.reader && handle.seq < self.next_seq
    }
}

/// Lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleStatus {
    /// Handed out and not yet released.
    Issued,
    /// Released. Terminal.
    Released,
}

/// What a segment's bytes live in.
pub(crate) enum Backing<H> {
    /// Storage-owned memory lent by the source.
    Mapped(H),
    /// A pool buffer filled by a copying read.
    Pooled(Bytes),
}
