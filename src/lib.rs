//! stripeio
//!
//! I/O coalescing and buffer lifecycle beneath a columnar format reader.
//!
//! Column readers ask for many byte ranges within one stripe. `stripeio`
//! decides how to serve them with few physical reads, trading some extra
//! bytes read for fewer I/O calls, and manages the buffers behind those
//! reads:
//!
//! - merge planning over an offset-ordered [`ChunkList`]
//! - populating chunks by sharing the raw read or compacting it
//! - a size-keyed [`BufferPool`] for fallback and compaction buffers
//! - a [`ZeroCopyReader`] that lends storage memory and enforces
//!   exactly-once release of every buffer it hands out
//!
//! The crate intentionally:
//! - does NOT parse file formats or footers
//! - does NOT decode or decompress column data
//! - does NOT manage concurrency
//! - does NOT schedule reads across stripes
//!
//! # Plain reads
//!
//! ```
//! use stripeio::{read_ranges, BufferPool, ChunkList, MemorySource, ReadConfig};
//!
//! let mut source = MemorySource::new((0..=255u8).cycle().take(16 * 1024).collect::<Vec<_>>());
//! let mut list = ChunkList::from_ranges([(1000, 1000), (2000, 1000), (4000, 1000)])?;
//!
//! let config = ReadConfig::default()
//!     .with_max_merge_distance(1024)
//!     .with_extra_bytes_fraction_threshold(0.1);
//! let stats = read_ranges(&mut list, &mut source, &mut BufferPool::new(), &config)?;
//!
//! assert_eq!(stats.reads, 1);
//! assert_eq!(list.get(2)?.data().unwrap()[0], (4000 % 256) as u8);
//! # Ok::<(), stripeio::ReadError>(())
//! ```
//!
//! # Zero-copy reads
//!
//! ```
//! use stripeio::{BufferPool, ChunkList, MemorySource, ReadConfig, ZeroCopyReader};
//!
//! let source = MemorySource::new(vec![0u8; 8192]).with_zero_copy(0, 4096);
//! let mut reader = ZeroCopyReader::new(source, BufferPool::new());
//!
//! let mut list = ChunkList::from_ranges([(5000, 1000), (6000, 1000)])?;
//! reader.read_ranges(&mut list, &ReadConfig::default())?;
//!
//! reader.release_all_buffers()?;
//! assert!(reader.source().is_all_released());
//! # Ok::<(), stripeio::ReadError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod chunk;
mod config;
mod error;
mod reader;
mod source;
mod zero_copy;

//
// Public surface
//

pub use buffer::{BufferPool, DEFAULT_MAX_PER_SIZE};
pub use chunk::{Chunk, ChunkId, ChunkList};
pub use config::ReadConfig;
pub use error::ReadError;
pub use reader::{
    ChunkReader, PopulateStrategy, Population, ReadStats, find_single_read, read_ranges,
};
pub use source::{ByteSource, MappedRegion, MemorySource, SeekSource, ZeroCopySource};
pub use zero_copy::{HandleId, HandleStatus, ZeroCopyReader};
