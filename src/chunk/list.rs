//! The ChunkList arena.

use crate::chunk::Chunk;
use crate::error::ReadError;

/// Position of a [`Chunk`] inside its [`ChunkList`].
///
/// The chunk after `id` is always `id + 1`; there are no stored links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId(usize);

impl ChunkId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the zero-based position.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered chunks for one stripe.
///
/// Chunks must be pushed in ascending offset order. Overlapping and nested
/// ranges are fine; the list is never re-sorted.
///
/// # Example
///
/// ```
/// use stripeio::ChunkList;
///
/// let list = ChunkList::from_ranges([(1000, 1000), (2000, 1000)])?;
/// let head = list.head()?;
/// assert_eq!(list.chunk(head)?.offset(), 1000);
/// assert_eq!(list.get(1)?.offset(), 2000);
/// # Ok::<(), stripeio::ReadError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChunkList {
    chunks: Vec<Chunk>,
}

impl ChunkList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from `(offset, length)` pairs in order.
    pub fn from_ranges<I>(ranges: I) -> Result<Self, ReadError>
    where
        I: IntoIterator<Item = (u64, u32)>,
    {
        let mut list = Self::new();
        for (offset, length) in ranges {
            list.push(offset, length)?;
        }
        Ok(list)
    }

    /// Appends a chunk after the current tail.
    pub fn push(&mut self, offset: u64, length: u32) -> Result<ChunkId, ReadError> {
        let chunk = Chunk::new(offset, length)?;
        debug_assert!(
            self.chunks.last().is_none_or(|tail| tail.offset() <= offset),
            "chunks must be pushed in ascending offset order"
        );
        self.chunks.push(chunk);
        Ok(ChunkId(self.chunks.len() - 1))
    }

    /// Returns the number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the list has no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the id of the first chunk.
    pub fn head(&self) -> Result<ChunkId, ReadError> {
        if self.chunks.is_empty() {
            return Err(ReadError::EmptyList);
        }
        Ok(ChunkId(0))
    }

    /// Returns the chunk at position `index`.
    pub fn get(&self, index: usize) -> Result<&Chunk, ReadError> {
        self.chunks.get(index).ok_or(ReadError::IndexOutOfRange {
            index,
            len: self.chunks.len(),
        })
    }

    /// Returns the id of the chunk at position `index`.
    pub fn id_at(&self, index: usize) -> Result<ChunkId, ReadError> {
        self.get(index).map(|_| ChunkId(index))
    }

    /// Returns the chunk named by `id`.
    pub fn chunk(&self, id: ChunkId) -> Result<&Chunk, ReadError> {
        self.get(id.0)
    }

    pub(crate) fn chunk_mut(&mut self, id: ChunkId) -> Result<&mut Chunk, ReadError> {
        let len = self.chunks.len();
        self.chunks
            .get_mut(id.0)
            .ok_or(ReadError::IndexOutOfRange { index: id.0, len })
    }

    /// Returns the id following `id`, or `None` at the tail.
    pub fn next(&self, id: ChunkId) -> Option<ChunkId> {
        let next = id.0 + 1;
        (next < self.chunks.len()).then_some(ChunkId(next))
    }

    /// Returns the first chunk at or after `id` that has no data yet.
    pub fn first_unpopulated_from(&self, id: ChunkId) -> Option<ChunkId> {
        self.iter_from(id)
            .find(|(_, chunk)| !chunk.has_data())
            .map(|(id, _)| id)
    }

    /// Iterates over all chunks in order.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &Chunk)> {
        self.iter_from(ChunkId(0))
    }

    /// Iterates forward starting at `id`.
    pub fn iter_from(&self, id: ChunkId) -> impl Iterator<Item = (ChunkId, &Chunk)> {
        self.chunks
            .iter()
            .enumerate()
            .skip(id.0)
            .map(|(i, chunk)| (ChunkId(i), chunk))
    }

    /// Drops every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
