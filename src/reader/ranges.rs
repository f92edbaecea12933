//! Reading a whole chunk list through a plain byte source.

use crate::buffer::BufferPool;
use crate::chunk::ChunkList;
use crate::config::ReadConfig;
use crate::error::ReadError;
use crate::source::ByteSource;

use super::window::next_window;
use super::{ChunkReader, PopulateStrategy, Population};

/// Totals across the windows read by one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Physical reads issued.
    pub reads: usize,
    /// Bytes covered by the physical reads.
    pub read_bytes: u64,
    /// Bytes requested by the populated chunks.
    pub req_bytes: u64,
    /// Bytes kept alive by the populated chunks.
    pub resident_bytes: u64,
}

impl ReadStats {
    pub(crate) fn record(&mut self, reader: &ChunkReader, resident_bytes: u64) {
        self.reads += 1;
        self.read_bytes += reader.read_bytes();
        self.req_bytes += reader.req_bytes();
        self.resident_bytes += resident_bytes;
    }
}

impl ChunkReader {
    /// Reads this window from `source` in one call and populates its chunks.
    ///
    /// With buffer reuse enabled the raw read lands in a pooled buffer, which
    /// goes back to the pool once compaction has released it.
    pub fn read_ranges<S: ByteSource + ?Sized>(
        &self,
        list: &mut ChunkList,
        source: &mut S,
        pool: &mut BufferPool,
        config: &ReadConfig,
    ) -> Result<Population, ReadError> {
        let length = u32::try_from(self.read_bytes()).map_err(|_| ReadError::WindowTooLarge {
            bytes: self.read_bytes(),
        })?;
        self.check_unpopulated(list)?;

        let threshold = config.extra_bytes_fraction_threshold();
        if !config.allow_buffer_reuse() {
            let buffer = source.read(self.offset(), length)?;
            return self.populate_chunks(list, &buffer, None, threshold);
        }

        let mut buf = pool.acquire_exact(length as usize);
        if let Err(e) = source.read_exact_at(self.offset(), &mut buf) {
            pool.release(buf);
            return Err(e.into());
        }
        let buffer = buf.freeze();
        let population = self.populate_chunks(list, &buffer, Some(&mut *pool), threshold)?;
        if population.strategy == PopulateStrategy::Compacted {
            pool.reclaim(buffer);
        }
        Ok(population)
    }
}

/// Reads every unpopulated chunk in `list`, one physical read per merge window.
///
/// Windows are discovered with `config`'s merge distance and populated with
/// its waste threshold. Chunks that already carry data are skipped and never
/// absorbed into a window.
///
/// # Example
///
/// ```
/// use stripeio::{read_ranges, BufferPool, ChunkList, MemorySource, ReadConfig};
///
/// let mut source = MemorySource::new(vec![7u8; 10_000]);
/// let mut list = ChunkList::from_ranges([(0, 100), (100, 100), (5000, 10)])?;
/// let stats = read_ranges(&mut list, &mut source, &mut BufferPool::new(), &ReadConfig::default())?;
/// assert_eq!(stats.reads, 2);
/// assert!(list.iter().all(|(_, chunk)| chunk.has_data()));
/// # Ok::<(), stripeio::ReadError>(())
/// ```
pub fn read_ranges<S: ByteSource + ?Sized>(
    list: &mut ChunkList,
    source: &mut S,
    pool: &mut BufferPool,
    config: &ReadConfig,
) -> Result<ReadStats, ReadError> {
    config.validate()?;

    let mut stats = ReadStats::default();
    let mut next = list.head().ok();
    while let Some(start) = next.and_then(|id| list.first_unpopulated_from(id)) {
        let reader = next_window(list, start, config.max_merge_distance())?;
        let population = reader.read_ranges(list, source, pool, config)?;
        stats.record(&reader, population.resident_bytes);
        next = list.next(reader.to());
    }
    Ok(stats)
}
