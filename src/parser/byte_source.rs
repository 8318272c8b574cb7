//! Seekable random-access byte source
//!
//! The one owner of the file cursor. Every higher layer reads through this
//! type, so switching splitting strategies can never lose buffered data: the
//! position reported here is always the authoritative one.

use super::{ParseError, ParseResult};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Buffered reader over any `Read + Seek` with absolute-position peeks.
pub struct ByteSource<R: Read + Seek> {
    inner: BufReader<R>,
    len: u64,
}

impl<R: Read + Seek> ByteSource<R> {
    /// Wrap a reader, measuring its total length up front
    pub fn new(mut inner: R) -> ParseResult<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(ByteSource {
            inner: BufReader::new(inner),
            len,
        })
    }

    /// Total size of the underlying input in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True for a zero-length input
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current absolute cursor position
    pub fn position(&mut self) -> ParseResult<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Move the cursor; returns the new absolute position
    pub fn seek(&mut self, pos: SeekFrom) -> ParseResult<u64> {
        Ok(self.inner.seek(pos)?)
    }

    /// Read up to `n` bytes, short only at end of input
    pub fn read(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(got) => filled += got,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::from(e)),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Consume a single byte, `None` at end of input
    pub fn read_byte(&mut self) -> ParseResult<Option<u8>> {
        let byte = self.inner.fill_buf()?.first().copied();
        if byte.is_some() {
            self.inner.consume(1);
        }
        Ok(byte)
    }

    /// Look at the next byte without consuming it
    pub fn peek_byte(&mut self) -> ParseResult<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    /// Read up to `n` bytes and restore the cursor afterwards
    pub fn peek(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        let saved = self.position()?;
        let bytes = self.read(n)?;
        self.seek(SeekFrom::Start(saved))?;
        Ok(bytes)
    }
}
