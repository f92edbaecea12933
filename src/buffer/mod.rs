//! Buffer management for fallback and compacting reads.
//!
//! [`BufferPool`] keeps released buffers by capacity so repeated reads of
//! similar windows do not allocate each time.

mod pool;

pub use pool::{BufferPool, DEFAULT_MAX_PER_SIZE};
