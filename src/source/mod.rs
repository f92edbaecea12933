//! Byte-source capabilities the read path depends on.
//!
//! - [`ByteSource`] - Positional blocking reads (required)
//! - [`ZeroCopySource`] - Borrow already-resident memory instead of copying (optional)
//! - [`MemorySource`] - In-memory source, optionally zero-copy
//! - [`SeekSource`] - Adapter over any [`Read`](std::io::Read) + [`Seek`](std::io::Seek)

use std::io;

use bytes::Bytes;

mod memory;
mod seek;

pub use memory::MemorySource;
pub use seek::SeekSource;

/// A source of bytes addressed by absolute offset.
///
/// Reads are blocking and either fill the whole buffer or fail.
pub trait ByteSource {
    /// Fills `buf` with the bytes starting at `offset`.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Reads exactly `length` bytes starting at `offset`.
    fn read(&mut self, offset: u64, length: u32) -> io::Result<Bytes> {
        let mut buf = vec![0u8; length as usize];
        self.read_exact_at(offset, &mut buf)?;
        Ok(Bytes::from(buf))
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact_at(offset, buf)
    }

    fn read(&mut self, offset: u64, length: u32) -> io::Result<Bytes> {
        (**self).read(offset, length)
    }
}

/// A region of storage-owned memory returned by [`ZeroCopySource::zero_copy_read`].
#[derive(Debug)]
pub struct MappedRegion<H> {
    /// Token that must be passed back to [`ZeroCopySource::release`].
    pub handle: H,
    /// Absolute offset of the first byte in `data`.
    pub offset: u64,
    /// The mapped bytes. May be shorter than requested.
    pub data: Bytes,
}

/// A byte source that can lend resident memory without copying.
pub trait ZeroCopySource: ByteSource {
    /// Source-specific token for one mapping.
    type Handle;

    /// Maps up to `length` bytes starting at `offset`.
    ///
    /// Returns `Ok(None)` when the position cannot be served without a copy.
    /// The region may stop short of `length`, for instance at a block
    /// boundary.
    fn zero_copy_read(
        &mut self,
        offset: u64,
        length: u32,
    ) -> io::Result<Option<MappedRegion<Self::Handle>>>;

    /// Gives a mapping back to the source.
    fn release(&mut self, handle: Self::Handle) -> io::Result<()>;

    /// Returns the number of mappings handed out and not yet released.
    fn outstanding_mappings(&self) -> usize;
}
