//! Merge-window discovery.

use tracing::debug;

use crate::chunk::{ChunkId, ChunkList};
use crate::error::ReadError;

/// A run of chunks `[from, to]` served by one physical read.
///
/// The physical read covers `[offset, offset + read_bytes)`, where the end is
/// the furthest chunk end in the window. Nested ranges therefore never extend
/// past their enclosing chunk's read.
///
/// # Example
///
/// ```
/// use stripeio::{ChunkList, ChunkReader};
///
/// let list = ChunkList::from_ranges([(1000, 1000), (2000, 1000), (4000, 1000)])?;
/// let reader = ChunkReader::create(&list, list.head()?, 1000)?;
/// assert_eq!(reader.to(), list.id_at(2)?);
/// assert_eq!(reader.read_bytes(), 4000);
/// assert_eq!(reader.req_bytes(), 3000);
/// # Ok::<(), stripeio::ReadError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReader {
    from: ChunkId,
    to: ChunkId,
    offset: u64,
    read_bytes: u64,
    req_bytes: u64,
}

impl ChunkReader {
    /// Finds the window starting at `from`.
    ///
    /// Chunks overlapping or abutting the bytes covered so far are always
    /// absorbed. A chunk after a gap is absorbed only if the gap is at most
    /// `max_merge_distance` bytes; the first larger gap ends the window.
    pub fn create(
        list: &ChunkList,
        from: ChunkId,
        max_merge_distance: u64,
    ) -> Result<Self, ReadError> {
        let first = list.chunk(from)?;
        let mut to = from;
        let mut current_end = first.end();
        let mut req_bytes = u64::from(first.length());

        for (id, next) in list.iter_from(from).skip(1) {
            if next.offset() > current_end && next.offset() - current_end > max_merge_distance {
                break;
            }
            to = id;
            current_end = current_end.max(next.end());
            req_bytes += u64::from(next.length());
        }

        let reader = Self {
            from,
            to,
            offset: first.offset(),
            read_bytes: current_end - first.offset(),
            req_bytes,
        };
        debug!(
            from = from.index(),
            to = to.index(),
            offset = reader.offset,
            read_bytes = reader.read_bytes,
            req_bytes = reader.req_bytes,
            max_merge_distance,
            "merge window"
        );
        Ok(reader)
    }

    /// Builds a reader over a known window without searching.
    pub fn create_between(list: &ChunkList, from: ChunkId, to: ChunkId) -> Result<Self, ReadError> {
        let first = list.chunk(from)?;
        let last = list.chunk(to)?;
        if to < from {
            return Err(ReadError::InvalidRange {
                offset: first.offset(),
                length: 0,
                message: "window ends before it starts",
            });
        }

        let (current_end, req_bytes) = list
            .iter_from(from)
            .take(to.index() - from.index() + 1)
            .fold((first.end(), 0u64), |(end, req), (_, chunk)| {
                (end.max(chunk.end()), req + u64::from(chunk.length()))
            });
        debug_assert!(current_end >= last.end());

        Ok(Self {
            from,
            to,
            offset: first.offset(),
            read_bytes: current_end - first.offset(),
            req_bytes,
        })
    }

    /// Returns the first chunk of the window.
    pub fn from(&self) -> ChunkId {
        self.from
    }

    /// Returns the last chunk of the window.
    pub fn to(&self) -> ChunkId {
        self.to
    }

    /// Returns the offset the physical read starts at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the offset the physical read ends at (exclusive).
    pub fn end(&self) -> u64 {
        self.offset + self.read_bytes
    }

    /// Returns the number of bytes the physical read covers.
    pub fn read_bytes(&self) -> u64 {
        self.read_bytes
    }

    /// Returns the sum of the requested lengths in the window.
    ///
    /// Overlapping bytes count once per chunk requesting them.
    pub fn req_bytes(&self) -> u64 {
        self.req_bytes
    }

    /// Returns `(read_bytes - req_bytes) / read_bytes`.
    ///
    /// Negative when overlapping chunks request more bytes than are read.
    pub fn extra_bytes_fraction(&self) -> f64 {
        (self.read_bytes as f64 - self.req_bytes as f64) / self.read_bytes as f64
    }

    /// Returns the number of chunks in the window.
    pub fn len(&self) -> usize {
        self.to.index() - self.from.index() + 1
    }

    /// Always false; a window holds at least one chunk.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the chunk ids in the window.
    pub fn chunk_ids(&self) -> impl Iterator<Item = ChunkId> + use<> {
        (self.from.index()..=self.to.index()).map(ChunkId::from_index)
    }
}

/// Finds the window at the head of `list` that bridges no gaps.
pub fn find_single_read(list: &ChunkList) -> Result<ChunkReader, ReadError> {
    ChunkReader::create(list, list.head()?, 0)
}

/// Finds the window starting at `start`, cut short before any chunk that is
/// already populated.
pub(crate) fn next_window(
    list: &ChunkList,
    start: ChunkId,
    max_merge_distance: u64,
) -> Result<ChunkReader, ReadError> {
    let reader = ChunkReader::create(list, start, max_merge_distance)?;
    let populated = list
        .iter_from(start)
        .take(reader.len())
        .find(|(_, chunk)| chunk.has_data());

    match populated {
        Some((id, _)) if id > start => {
            ChunkReader::create_between(list, start, ChunkId::from_index(id.index() - 1))
        }
        _ => Ok(reader),
    }
}
