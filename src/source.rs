use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

/// Seekable random-access reader the parser pulls bytes from.
///
/// The parser only ever issues sequential `read_at` calls from a single
/// flow; implementations do not need to support concurrent use.
pub trait ByteSource {
    /// Read exactly `len` bytes starting at absolute `offset`.
    fn read_at(&mut self, len: u64, offset: u64) -> Result<Vec<u8>>;

    /// Total length of the underlying data in bytes.
    fn size(&self) -> u64;
}

/// `ByteSource` over any `Read + Seek` stream (a file, a `Cursor`, ...).
///
/// The stream length is captured once at construction.
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    size: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, size })
    }
}

impl ReaderSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read_at(&mut self, len: u64, offset: u64) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len as usize];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
