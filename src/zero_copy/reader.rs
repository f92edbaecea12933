//! Zero-copy reads with exactly-once buffer release.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::buffer::BufferPool;
use crate::chunk::{ChunkId, ChunkList};
use crate::config::ReadConfig;
use crate::error::ReadError;
use crate::reader::{ChunkReader, ReadStats, next_window};
use crate::source::ZeroCopySource;

use super::handle::{Backing, HandleId, HandleIssuer, HandleStatus};

struct Segment {
    offset: u64,
    data: Bytes,
}

impl Segment {
    fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Reads windows through a [`ZeroCopySource`] and tracks every buffer it
/// hands out.
///
/// Each physical segment (a mapped region, or a pooled buffer when the
/// source cannot map a position) is registered under a fresh [`HandleId`].
/// A handle moves from `Issued` to `Released` exactly once; releasing it
/// again, or releasing a handle this reader never issued, is an error.
///
/// Only outstanding handles are kept; a released handle is forgotten, and
/// the reader still recognizes it as its own by issue order.
///
/// Dropping the reader releases whatever is still outstanding.
///
/// # Example
///
/// ```
/// use stripeio::{BufferPool, ChunkList, MemorySource, ZeroCopyReader};
///
/// let source = MemorySource::new(vec![1u8; 8192]).with_zero_copy(0, 4096);
/// let mut reader = ZeroCopyReader::new(source, BufferPool::new());
///
/// let mut list = ChunkList::from_ranges([(100, 50), (150, 50)])?;
/// let (from, to) = (list.head()?, list.id_at(1)?);
/// let handles = reader.read_range(&mut list, from, to)?;
/// assert_eq!(handles.len(), 1);
///
/// reader.release_buffer(handles[0])?;
/// assert!(reader.release_buffer(handles[0]).is_err());
/// # Ok::<(), stripeio::ReadError>(())
/// ```
pub struct ZeroCopyReader<S: ZeroCopySource> {
    source: S,
    pool: BufferPool,
    issuer: HandleIssuer,
    outstanding: BTreeMap<HandleId, Backing<S::Handle>>,
}

impl<S: ZeroCopySource> ZeroCopyReader<S> {
    /// Wraps `source`, falling back to buffers from `pool`.
    pub fn new(source: S, pool: BufferPool) -> Self {
        Self {
            source,
            pool,
            issuer: HandleIssuer::new(),
            outstanding: BTreeMap::new(),
        }
    }

    /// Reads the window `[from, to]` and populates its chunks.
    ///
    /// Returns the handles of the segments issued for the read. Chunks inside
    /// a single segment are views into it; a chunk straddling two segments
    /// gets its own copy. Handles issued before a failure stay outstanding
    /// and are cleaned up by [`release_all_buffers`](Self::release_all_buffers).
    pub fn read_range(
        &mut self,
        list: &mut ChunkList,
        from: ChunkId,
        to: ChunkId,
    ) -> Result<Vec<HandleId>, ReadError> {
        let window = ChunkReader::create_between(list, from, to)?;
        window.check_unpopulated(list)?;

        let (handles, segments) = self.read_segments(window.offset(), window.end())?;
        for id in window.chunk_ids() {
            let chunk = list.chunk_mut(id)?;
            let data = slice_segments(&segments, chunk.offset(), u64::from(chunk.length()))?;
            chunk.set_data(data)?;
        }

        trace!(
            offset = window.offset(),
            read_bytes = window.read_bytes(),
            segments = segments.len(),
            "zero-copy window populated"
        );
        Ok(handles)
    }

    /// Reads every unpopulated chunk in `list`, one window at a time.
    ///
    /// Only `config`'s merge distance applies. Chunks always view the
    /// segments they were read into, so the waste threshold and buffer reuse
    /// settings have no effect here.
    pub fn read_ranges(
        &mut self,
        list: &mut ChunkList,
        config: &ReadConfig,
    ) -> Result<ReadStats, ReadError> {
        config.validate()?;

        let mut stats = ReadStats::default();
        let mut next = list.head().ok();
        while let Some(start) = next.and_then(|id| list.first_unpopulated_from(id)) {
            let window = next_window(list, start, config.max_merge_distance())?;
            self.read_range(list, window.from(), window.to())?;
            stats.record(&window, window.read_bytes());
            next = list.next(window.to());
        }
        Ok(stats)
    }

    /// Releases one issued handle.
    ///
    /// # Errors
    ///
    /// [`ReadError::InvalidHandle`] if the handle was not issued by this
    /// reader or was already released. Source release failures propagate.
    pub fn release_buffer(&mut self, handle: HandleId) -> Result<(), ReadError> {
        match self.outstanding.remove(&handle) {
            Some(backing) => {
                trace!(%handle, "releasing buffer");
                self.release_backing(backing)
            }
            None if self.issuer.issued(handle) => Err(ReadError::InvalidHandle {
                handle,
                reason: "already released",
            }),
            None => Err(ReadError::InvalidHandle {
                handle,
                reason: "not issued by this reader",
            }),
        }
    }

    /// Releases every handle still issued, in issue order.
    ///
    /// Succeeds when nothing is outstanding. Keeps going past a failing
    /// source release and returns the first failure.
    pub fn release_all_buffers(&mut self) -> Result<(), ReadError> {
        let issued: Vec<HandleId> = self.outstanding.keys().copied().collect();

        let mut first_err = None;
        for handle in issued {
            if let Err(e) = self.release_buffer(handle) {
                warn!(%handle, error = %e, "buffer release failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Returns the number of issued, unreleased handles.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Returns the state of `handle`, or `None` if this reader never issued it.
    pub fn status(&self, handle: HandleId) -> Option<HandleStatus> {
        if self.outstanding.contains_key(&handle) {
            Some(HandleStatus::Issued)
        } else if self.issuer.issued(handle) {
            Some(HandleStatus::Released)
        } else {
            None
        }
    }

    /// Returns true if `handle` is issued and unreleased.
    pub fn is_issued(&self, handle: HandleId) -> bool {
        self.status(handle) == Some(HandleStatus::Issued)
    }

    /// Returns the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the wrapped source mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the fallback pool.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Returns the fallback pool mutably.
    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    fn read_segments(
        &mut self,
        start: u64,
        end: u64,
    ) -> Result<(Vec<HandleId>, Vec<Segment>), ReadError> {
        let mut handles = Vec::new();
        let mut segments = Vec::new();
        let mut pos = start;

        while pos < end {
            let remaining = u32::try_from(end - pos).unwrap_or(u32::MAX);
            let (data, backing) = match self.source.zero_copy_read(pos, remaining)? {
                Some(region) => {
                    let len = region.data.len() as u64;
                    if region.offset > pos || pos - region.offset >= len {
                        self.source.release(region.handle)?;
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "mapped region {}+{} does not cover offset {}",
                                region.offset, len, pos
                            ),
                        )
                        .into());
                    }
                    let skip = (pos - region.offset) as usize;
                    let take = (region.data.len() - skip).min(remaining as usize);
                    (
                        region.data.slice(skip..skip + take),
                        Backing::Mapped(region.handle),
                    )
                }
                None => {
                    debug!(
                        offset = pos,
                        length = remaining,
                        "zero-copy unavailable, reading into pooled buffer"
                    );
                    let mut buf = self.pool.acquire_exact(remaining as usize);
                    if let Err(e) = self.source.read_exact_at(pos, &mut buf) {
                        self.pool.release(buf);
                        return Err(e.into());
                    }
                    let data = buf.freeze();
                    (data.clone(), Backing::Pooled(data))
                }
            };

            let handle = self.issuer.issue();
            self.outstanding.insert(handle, backing);
            handles.push(handle);

            let segment = Segment { offset: pos, data };
            pos = segment.end();
            segments.push(segment);
        }
        Ok((handles, segments))
    }

    fn release_backing(&mut self, backing: Backing<S::Handle>) -> Result<(), ReadError> {
        match backing {
            Backing::Mapped(handle) => self.source.release(handle)?,
            Backing::Pooled(data) => {
                self.pool.reclaim(data);
            }
        }
        Ok(())
    }
}

/// Returns the bytes `[offset, offset + length)` from consecutive segments,
/// as a view when one segment holds them all and as a copy otherwise.
fn slice_segments(segments: &[Segment], offset: u64, length: u64) -> Result<Bytes, ReadError> {
    let end = offset + length;
    let first = segments.partition_point(|s| s.end() <= offset);
    let uncovered = ReadError::InvalidRange {
        offset,
        length,
        message: "range not covered by the segments read",
    };

    let Some(segment) = segments.get(first).filter(|s| s.offset <= offset) else {
        return Err(uncovered);
    };
    if end <= segment.end() {
        let start = (offset - segment.offset) as usize;
        return Ok(segment.data.slice(start..start + length as usize));
    }

    let mut copy = BytesMut::with_capacity(length as usize);
    let mut pos = offset;
    for segment in &segments[first..] {
        if pos >= end {
            break;
        }
        let start = (pos - segment.offset) as usize;
        let stop = (segment.end().min(end) - segment.offset) as usize;
        copy.extend_from_slice(&segment.data[start..stop]);
        pos = segment.offset + stop as u64;
    }
    if pos < end {
        return Err(uncovered);
    }
    Ok(copy.freeze())
}

impl<S: ZeroCopySource> fmt::Debug for ZeroCopyReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroCopyReader")
            .field("issuer", &self.issuer)
            .field("outstanding", &self.outstanding())
            .field("pool", &self.pool)
            .finish()
    }
}

impl<S: ZeroCopySource> Drop for ZeroCopyReader<S> {
    fn drop(&mut self) {
        let outstanding = self.outstanding();
        if outstanding == 0 {
            return;
        }
        warn!(outstanding, "zero-copy reader dropped with outstanding buffers");
        if let Err(e) = self.release_all_buffers() {
            warn!(error = %e, "failed to release buffers on drop");
        }
    }
}
