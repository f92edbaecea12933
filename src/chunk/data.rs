//! The Chunk type - one requested byte range and, once read, its bytes.

use bytes::Bytes;
use std::fmt;

use crate::error::ReadError;

/// A requested byte range within a stripe.
///
/// `offset` and `length` are fixed at creation. `data` starts out empty and
/// is set exactly once when the range is read; afterwards `data.len()` always
/// equals `length`.
///
/// # Example
///
/// ```
/// use stripeio::Chunk;
///
/// let chunk = Chunk::new(100, 5)?;
/// assert_eq!(chunk.end(), 105);
/// assert!(!chunk.has_data());
/// # Ok::<(), stripeio::ReadError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    offset: u64,
    length: u32,
    data: Option<Bytes>,
}

impl Chunk {
    /// Creates an unpopulated chunk for `[offset, offset + length)`.
    ///
    /// Returns error if `length` is zero or the end overflows `u64`.
    pub fn new(offset: u64, length: u32) -> Result<Self, ReadError> {
        if length == 0 {
            return Err(ReadError::InvalidRange {
                offset,
                length: 0,
                message: "chunk length must be non-zero",
            });
        }

        if offset.checked_add(u64::from(length)).is_none() {
            return Err(ReadError::InvalidRange {
                offset,
                length: u64::from(length),
                message: "chunk end overflows u64",
            });
        }

        Ok(Self {
            offset,
            length,
            data: None,
        })
    }

    /// Returns the start offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the requested length.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Returns the end offset (exclusive).
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.length)
    }

    /// Returns the chunk as a range.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.offset..self.end()
    }

    /// Returns true once the chunk has been populated.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Returns the chunk data, if populated.
    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Takes the data out, leaving the chunk unpopulated.
    pub fn take_data(&mut self) -> Option<Bytes> {
        self.data.take()
    }

    /// Sets the data. The chunk must be unpopulated and `data` must be exactly
    /// `length` bytes.
    pub(crate) fn set_data(&mut self, data: Bytes) -> Result<(), ReadError> {
        if self.data.is_some() {
            return Err(ReadError::AlreadyPopulated {
                offset: self.offset,
            });
        }

        if data.len() != self.length as usize {
            return Err(ReadError::ShortBuffer {
                expected: u64::from(self.length),
                actual: data.len() as u64,
            });
        }

        self.data = Some(data);
        Ok(())
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk([{}, {})", self.offset, self.end())?;
        if self.data.is_some() {
            write!(f, ", populated")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let chunk = Chunk::new(100, 5).unwrap();
        assert_eq!(chunk.offset(), 100);
        assert_eq!(chunk.length(), 5);
        assert!(!chunk.has_data());
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            Chunk::new(100, 0),
            Err(ReadError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(Chunk::new(u64::MAX - 2, 3).is_err());
        assert!(Chunk::new(u64::MAX - 3, 3).is_ok());
    }

    #[test]
    fn test_end_and_range() {
        let chunk = Chunk::new(100, 5).unwrap();
        assert_eq!(chunk.end(), 105);
        assert_eq!(chunk.range(), 100..105);
    }

    #[test]
    fn test_set_data_once() {
        let mut chunk = Chunk::new(0, 3).unwrap();
        chunk.set_data(Bytes::from_static(b"abc")).unwrap();
        assert_eq!(chunk.data().unwrap().as_ref(), b"abc");

        let err = chunk.set_data(Bytes::from_static(b"xyz")).unwrap_err();
        assert!(matches!(err, ReadError::AlreadyPopulated { offset: 0 }));
        assert_eq!(chunk.data().unwrap().as_ref(), b"abc");
    }

    #[test]
    fn test_set_data_wrong_length() {
        let mut chunk = Chunk::new(0, 4).unwrap();
        assert!(chunk.set_data(Bytes::from_static(b"abc")).is_err());
        assert!(!chunk.has_data());
    }

    #[test]
    fn test_take_data() {
        let mut chunk = Chunk::new(0, 2).unwrap();
        chunk.set_data(Bytes::from_static(b"hi")).unwrap();
        assert_eq!(chunk.take_data(), Some(Bytes::from_static(b"hi")));
        assert!(!chunk.has_data());
    }

    #[test]
    fn test_display() {
        let chunk = Chunk::new(100, 5).unwrap();
        let s = format!("{}", chunk);
        assert!(s.contains("[100, 105)"));
        assert!(!s.contains("populated"));
    }
}
