//! Distributing a physical read into the window's chunks.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::buffer::BufferPool;
use crate::chunk::{Chunk, ChunkList};
use crate::error::ReadError;

use super::ChunkReader;

/// How a window's chunks ended up backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopulateStrategy {
    /// Every chunk is a view into the raw read buffer.
    Shared,
    /// Every chunk is a view into one buffer holding only requested bytes.
    Compacted,
}

/// Outcome of populating one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    /// Strategy used.
    pub strategy: PopulateStrategy,
    /// Number of chunks populated.
    pub chunks: usize,
    /// Bytes kept alive by the window's chunks.
    pub resident_bytes: u64,
}

impl ChunkReader {
    /// Makes every chunk in the window a zero-copy view of `buffer`.
    ///
    /// `buffer` must hold the window's bytes starting at [`offset`](Self::offset).
    /// The whole buffer, gaps included, stays resident while any chunk lives.
    pub fn populate_chunks_as_is(
        &self,
        list: &mut ChunkList,
        buffer: &Bytes,
    ) -> Result<Population, ReadError> {
        self.check_buffer(buffer.len())?;
        self.check_unpopulated(list)?;

        for id in self.chunk_ids() {
            let chunk = list.chunk_mut(id)?;
            let range = self.relative(chunk);
            chunk.set_data(buffer.slice(range))?;
        }

        trace!(offset = self.offset(), chunks = self.len(), "populated shared");
        Ok(Population {
            strategy: PopulateStrategy::Shared,
            chunks: self.len(),
            resident_bytes: self.read_bytes(),
        })
    }

    /// Copies each chunk's bytes out of `buffer` into one compacted buffer of
    /// exactly [`req_bytes`](Self::req_bytes) bytes.
    ///
    /// Overlapping chunks each get their own copy. The compacted buffer comes
    /// from `pool` when one is given, and only a free buffer of exactly
    /// `req_bytes` capacity is reused, so residency is never more than
    /// reported.
    pub fn populate_chunks_reduce_size(
        &self,
        list: &mut ChunkList,
        buffer: &Bytes,
        pool: Option<&mut BufferPool>,
    ) -> Result<Population, ReadError> {
        self.check_buffer(buffer.len())?;
        self.check_unpopulated(list)?;

        let size = self.req_bytes() as usize;
        let mut compacted = match pool {
            Some(pool) => pool.acquire_exact(size),
            None => BytesMut::with_capacity(size),
        };
        compacted.clear();
        for id in self.chunk_ids() {
            let range = self.relative(list.chunk(id)?);
            compacted.extend_from_slice(&buffer[range]);
        }
        let compacted = compacted.freeze();

        let mut pos = 0;
        for id in self.chunk_ids() {
            let chunk = list.chunk_mut(id)?;
            let len = chunk.length() as usize;
            chunk.set_data(compacted.slice(pos..pos + len))?;
            pos += len;
        }

        trace!(
            offset = self.offset(),
            chunks = self.len(),
            dropped = self.read_bytes().saturating_sub(self.req_bytes()),
            "populated compacted"
        );
        Ok(Population {
            strategy: PopulateStrategy::Compacted,
            chunks: self.len(),
            resident_bytes: self.req_bytes(),
        })
    }

    /// Shares `buffer` when the window wastes little, compacts otherwise.
    ///
    /// A non-positive [`extra_bytes_fraction`](Self::extra_bytes_fraction)
    /// means no waste and always shares. Otherwise the buffer is shared when
    /// the fraction is below `threshold_fraction`.
    pub fn populate_chunks(
        &self,
        list: &mut ChunkList,
        buffer: &Bytes,
        pool: Option<&mut BufferPool>,
        threshold_fraction: f64,
    ) -> Result<Population, ReadError> {
        let fraction = self.extra_bytes_fraction();
        if fraction <= 0.0 || fraction < threshold_fraction {
            self.populate_chunks_as_is(list, buffer)
        } else {
            self.populate_chunks_reduce_size(list, buffer, pool)
        }
    }

    fn check_buffer(&self, len: usize) -> Result<(), ReadError> {
        if (len as u64) < self.read_bytes() {
            return Err(ReadError::ShortBuffer {
                expected: self.read_bytes(),
                actual: len as u64,
            });
        }
        Ok(())
    }

    /// Fails before any chunk is touched if one is already populated or lies
    /// before the window start.
    pub(crate) fn check_unpopulated(&self, list: &ChunkList) -> Result<(), ReadError> {
        for id in self.chunk_ids() {
            let chunk = list.chunk(id)?;
            if chunk.has_data() {
                return Err(ReadError::AlreadyPopulated {
                    offset: chunk.offset(),
                });
            }
            if chunk.offset() < self.offset() {
                return Err(ReadError::InvalidRange {
                    offset: chunk.offset(),
                    length: u64::from(chunk.length()),
                    message: "chunk starts before its window",
                });
            }
        }
        Ok(())
    }

    fn relative(&self, chunk: &Chunk) -> Range<usize> {
        let start = (chunk.offset() - self.offset()) as usize;
        start..start + chunk.length() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Byte at absolute position `p` is `p % 127`.
    fn window_bytes(reader: &ChunkReader) -> Bytes {
        (reader.offset()..reader.end())
            .map(|p| (p % 127) as u8)
            .collect::<Vec<_>>()
            .into()
    }

    fn assert_chunks_match(list: &ChunkList, reader: &ChunkReader) {
        for id in reader.chunk_ids() {
            let chunk = list.chunk(id).unwrap();
            let data = chunk.data().expect("chunk populated");
            assert_eq!(data.len(), chunk.length() as usize);
            for (i, &b) in data.iter().enumerate() {
                assert_eq!(b, ((chunk.offset() + i as u64) % 127) as u8, "{}", chunk);
            }
        }
    }

    fn gapped() -> ChunkList {
        ChunkList::from_ranges([(1000, 1000), (2000, 1000), (4000, 1000), (4100, 100)]).unwrap()
    }

    #[test]
    fn test_as_is_shares_buffer() {
        let mut list = gapped();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 1000).unwrap();
        let buffer = window_bytes(&reader);

        let population = reader.populate_chunks_as_is(&mut list, &buffer).unwrap();
        assert_eq!(population.strategy, PopulateStrategy::Shared);
        assert_eq!(population.resident_bytes, 4000);
        assert_chunks_match(&list, &reader);

        let nested = list.get(3).unwrap().data().unwrap();
        assert_eq!(nested.as_ptr(), buffer[3100..].as_ptr());
    }

    #[test]
    fn test_reduce_size_compacts() {
        let mut list = gapped();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 1000).unwrap();
        let buffer = window_bytes(&reader);

        let population = reader
            .populate_chunks_reduce_size(&mut list, &buffer, None)
            .unwrap();
        assert_eq!(population.strategy, PopulateStrategy::Compacted);
        assert_eq!(population.resident_bytes, 3100);
        assert_chunks_match(&list, &reader);

        let first = list.get(0).unwrap().data().unwrap().as_ptr() as usize;
        let last = list.get(3).unwrap().data().unwrap();
        assert_eq!(last.as_ptr() as usize + last.len() - first, 3100);
    }

    #[test]
    fn test_reduce_size_from_pool() {
        let mut pool = BufferPool::new();
        let spare = BytesMut::with_capacity(3100);
        let ptr = spare.as_ptr();
        pool.release(spare);

        let mut list = gapped();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 1000).unwrap();
        reader
            .populate_chunks_reduce_size(&mut list, &window_bytes(&reader), Some(&mut pool))
            .unwrap();
        assert_eq!(pool.free_buffers(), 0);
        assert_eq!(list.get(0).unwrap().data().unwrap().as_ptr(), ptr);
        assert_chunks_match(&list, &reader);
    }

    #[test]
    fn test_reduce_size_leaves_oversized_pool_buffer() {
        let mut pool = BufferPool::new();
        pool.release(BytesMut::with_capacity(1 << 20));

        let mut list = ChunkList::from_ranges([(0, 100), (4000, 100)]).unwrap();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 4000).unwrap();
        assert_eq!(reader.read_bytes(), 4100);

        let population = reader
            .populate_chunks_reduce_size(&mut list, &window_bytes(&reader), Some(&mut pool))
            .unwrap();
        assert_eq!(population.resident_bytes, 200);
        assert_eq!(pool.free_buffers(), 1);
        assert_eq!(pool.free_bytes(), 1 << 20);
        assert_chunks_match(&list, &reader);
    }

    #[test]
    fn test_dispatch_by_threshold() {
        let mut list = gapped();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 1000).unwrap();
        let buffer = window_bytes(&reader);
        let population = reader
            .populate_chunks(&mut list, &buffer, None, 1.0)
            .unwrap();
        assert_eq!(population.strategy, PopulateStrategy::Shared);

        let mut list = gapped();
        let population = reader
            .populate_chunks(&mut list, &buffer, None, 0.1)
            .unwrap();
        assert_eq!(population.strategy, PopulateStrategy::Compacted);
    }

    #[test]
    fn test_dispatch_no_waste_shares() {
        let mut list = ChunkList::from_ranges([(0, 100), (50, 100)]).unwrap();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 0).unwrap();
        let population = reader
            .populate_chunks(&mut list, &window_bytes(&reader), None, 0.0)
            .unwrap();
        assert_eq!(population.strategy, PopulateStrategy::Shared);
        assert_chunks_match(&list, &reader);
    }

    #[test]
    fn test_short_buffer_leaves_chunks_untouched() {
        let mut list = gapped();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 1000).unwrap();
        let err = reader
            .populate_chunks_as_is(&mut list, &Bytes::from(vec![0u8; 10]))
            .unwrap_err();
        assert!(matches!(err, ReadError::ShortBuffer { expected: 4000, actual: 10 }));
        assert!(list.iter().all(|(_, c)| !c.has_data()));
    }

    #[test]
    fn test_populated_chunk_rejected() {
        let mut list = gapped();
        let reader = ChunkReader::create(&list, list.head().unwrap(), 1000).unwrap();
        let buffer = window_bytes(&reader);
        reader.populate_chunks_as_is(&mut list, &buffer).unwrap();

        let err = reader
            .populate_chunks_reduce_size(&mut list, &buffer, None)
            .unwrap_err();
        assert!(matches!(err, ReadError::AlreadyPopulated { offset: 1000 }));
    }
}
