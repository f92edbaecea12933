//! Error types for stripeio.

use std::fmt;

use crate::zero_copy::HandleId;

/// Errors that can occur while planning, reading or releasing chunk buffers.
#[derive(Debug)]
pub enum ReadError {
    /// An I/O error reported by the byte source.
    Io(std::io::Error),

    /// A zero-copy handle was not issued by this reader, or was already released.
    InvalidHandle {
        /// The rejected handle.
        handle: HandleId,
        /// Why the handle was rejected.
        reason: &'static str,
    },

    /// A positional lookup past the end of a chunk list.
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// The length of the list.
        len: usize,
    },

    /// The chunk list has no chunks.
    EmptyList,

    /// A byte range or window that cannot be represented.
    InvalidRange {
        /// Start of the offending range.
        offset: u64,
        /// Length of the offending range.
        length: u64,
        /// Description of what was invalid.
        message: &'static str,
    },

    /// A read buffer holds fewer bytes than the window needs.
    ShortBuffer {
        /// Bytes the window covers.
        expected: u64,
        /// Bytes actually supplied.
        actual: u64,
    },

    /// A chunk already carries data.
    AlreadyPopulated {
        /// Offset of the populated chunk.
        offset: u64,
    },

    /// A merge window spans more bytes than a single read can return.
    WindowTooLarge {
        /// Bytes the window covers.
        bytes: u64,
    },

    /// Invalid configuration parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(e) => write!(f, "io error: {}", e),
            ReadError::InvalidHandle { handle, reason } => {
                write!(f, "invalid buffer handle {}: {}", handle, reason)
            }
            ReadError::IndexOutOfRange { index, len } => {
                write!(f, "chunk index {} out of range (len {})", index, len)
            }
            ReadError::EmptyList => write!(f, "chunk list is empty"),
            ReadError::InvalidRange {
                offset,
                length,
                message,
            } => write!(f, "invalid range {}+{}: {}", offset, length, message),
            ReadError::ShortBuffer { expected, actual } => {
                write!(f, "short buffer: {} bytes (need {})", actual, expected)
            }
            ReadError::AlreadyPopulated { offset } => {
                write!(f, "chunk at offset {} already has data", offset)
            }
            ReadError::WindowTooLarge { bytes } => {
                write!(f, "merge window too large: {} bytes", bytes)
            }
            ReadError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}
