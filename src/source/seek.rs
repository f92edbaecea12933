//! [`ByteSource`] over any seekable reader.

use std::io::{self, Read, Seek, SeekFrom};

use super::ByteSource;

/// Adapts a [`Read`] + [`Seek`] value, such as a [`std::fs::File`], into a
/// [`ByteSource`].
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use stripeio::{ByteSource, SeekSource};
///
/// let mut source = SeekSource::new(Cursor::new(b"0123456789".to_vec()));
/// assert_eq!(&source.read(3, 4)?[..], b"3456");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct SeekSource<R> {
    inner: R,
}

impl<R: Read + Seek> SeekSource<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns a reference to the wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwraps the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)
    }
}
