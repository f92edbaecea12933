//! In-memory byte source.

use std::collections::HashSet;
use std::io;

use bytes::Bytes;

use super::{ByteSource, MappedRegion, ZeroCopySource};

#[derive(Debug, Clone, Copy)]
struct Mapping {
    start: u64,
    block_size: u64,
}

/// A [`ByteSource`] over a buffer held in memory.
///
/// With [`with_zero_copy`](Self::with_zero_copy) it also acts as a
/// [`ZeroCopySource`]: bytes at or after the mapped start are lent out as
/// slices that stop at the next block boundary, and bytes before it can only
/// be copied. Outstanding mappings are tracked so leaks are observable.
///
/// # Example
///
/// ```
/// use stripeio::{ByteSource, MemorySource};
///
/// let mut source = MemorySource::new(b"hello world".to_vec());
/// let bytes = source.read(6, 5)?;
/// assert_eq!(&bytes[..], b"world");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    mapping: Option<Mapping>,
    outstanding: HashSet<u64>,
    next_handle: u64,
    copy_reads: usize,
    mapped_reads: usize,
}

impl MemorySource {
    /// Creates a copy-only source over `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mapping: None,
            outstanding: HashSet::new(),
            next_handle: 0,
            copy_reads: 0,
            mapped_reads: 0,
        }
    }

    /// Allows zero-copy reads from `mapped_from` onward, split at every
    /// `block_size` bytes past `mapped_from`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn with_zero_copy(mut self, mapped_from: u64, block_size: u64) -> Self {
        assert!(block_size > 0, "block_size must be non-zero");
        self.mapping = Some(Mapping {
            start: mapped_from,
            block_size,
        });
        self
    }

    /// Returns the backing bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the number of copying reads served.
    pub fn copy_reads(&self) -> usize {
        self.copy_reads
    }

    /// Returns the number of zero-copy regions handed out.
    pub fn mapped_reads(&self) -> usize {
        self.mapped_reads
    }

    /// Returns true when every mapping has been released.
    pub fn is_all_released(&self) -> bool {
        self.outstanding.is_empty()
    }

    fn bounds(&self, offset: u64, length: u64) -> io::Result<std::ops::Range<usize>> {
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= self.data.len() as u64)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "read {}+{} past end of {} byte source",
                        offset,
                        length,
                        self.data.len()
                    ),
                )
            })?;
        Ok(offset as usize..end as usize)
    }
}

impl ByteSource for MemorySource {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let range = self.bounds(offset, buf.len() as u64)?;
        buf.copy_from_slice(&self.data[range]);
        self.copy_reads += 1;
        Ok(())
    }
}

impl ZeroCopySource for MemorySource {
    type Handle = u64;

    fn zero_copy_read(
        &mut self,
        offset: u64,
        length: u32,
    ) -> io::Result<Option<MappedRegion<u64>>> {
        let Some(mapping) = self.mapping else {
            return Ok(None);
        };
        if offset < mapping.start || offset >= self.data.len() as u64 || length == 0 {
            return Ok(None);
        }

        let block_end = mapping.start
            + ((offset - mapping.start) / mapping.block_size + 1) * mapping.block_size;
        let end = (offset + u64::from(length))
            .min(block_end)
            .min(self.data.len() as u64);

        let handle = self.next_handle;
        self.next_handle += 1;
        self.outstanding.insert(handle);
        self.mapped_reads += 1;

        Ok(Some(MappedRegion {
            handle,
            offset,
            data: self.data.slice(offset as usize..end as usize),
        }))
    }

    fn release(&mut self, handle: u64) -> io::Result<()> {
        if self.outstanding.remove(&handle) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("mapping {} is not outstanding", handle),
            ))
        }
    }

    fn outstanding_mappings(&self) -> usize {
        self.outstanding.len()
    }
}
