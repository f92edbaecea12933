//! Range coalescing and chunk population.
//!
//! - [`ChunkReader`] - One merge window: discovery, waste metrics, population
//! - [`find_single_read`] - The window at the head of a list that bridges no gaps
//! - [`read_ranges`] - Read a whole list, one physical read per window
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use stripeio::{ChunkList, ChunkReader};
//!
//! let mut list = ChunkList::from_ranges([(10, 4), (12, 4), (20, 2)])?;
//! let reader = ChunkReader::create(&list, list.head()?, 4)?;
//! assert_eq!(reader.read_bytes(), 12);
//!
//! let raw = Bytes::from((10u8..22).collect::<Vec<_>>());
//! reader.populate_chunks(&mut list, &raw, None, 0.5)?;
//! assert_eq!(list.get(1)?.data().unwrap().as_ref(), &[12, 13, 14, 15]);
//! # Ok::<(), stripeio::ReadError>(())
//! ```

mod populate;
mod ranges;
mod window;

pub use populate::{PopulateStrategy, Population};
pub use ranges::{ReadStats, read_ranges};
pub use window::{ChunkReader, find_single_read};

pub(crate) use window::next_window;
