//! Chunk types.
//!
//! - [`Chunk`] - One requested byte range with optional data
//! - [`ChunkList`] - Offset-ordered arena of chunks for one stripe
//! - [`ChunkId`] - Position of a chunk in its list

mod data;
mod list;

pub use data::Chunk;
pub use list::{ChunkId, ChunkList};
