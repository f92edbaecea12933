//! Zero-copy reads and buffer handle tracking.
//!
//! - [`ZeroCopyReader`] - Issues handles per physical segment, enforces exactly-once release
//! - [`HandleId`] - Opaque handle name
//! - [`HandleStatus`] - `Issued` or `Released`

mod handle;
mod reader;

pub use handle::{HandleId, HandleStatus};
pub use reader::ZeroCopyReader;
