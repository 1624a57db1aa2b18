// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Input sources the parser can read from.
//!
//! `Stream` is the seam between the parser and whatever the bytes actually
//! come from. It is deliberately narrower than `std::io::Read`: the parser
//! only ever needs sequential reads plus an absolute position (`tell`), and
//! keeping the trait small is what lets a non-seekable source (a plain
//! `Read`) and a seekable one share the same scanning code, with only the
//! seekable kind supporting persistent-mode substreams.

use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom};
use std::rc::Rc;

use bytes::Bytes;

/// A source of bytes the parser can scan.
///
/// `tell()` returning `-1` means "position unknown" and is how the parser
/// learns a stream is not seekable; persistent-mode content storage is
/// disabled whenever that's the case, since there would be nothing to take
/// a substream of later.
pub trait Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn tell(&self) -> i64;

    fn eos(&self) -> bool;

    /// Returns a view of this stream bounded to the half-open byte range
    /// `[start, end)`, relative to the same absolute offsets `tell()`
    /// reports. Only ever called on seekable streams.
    fn substream(&self, start: i64, end: i64) -> Self
    where
        Self: Sized;
}

/// Reads the whole remaining content of a stream into memory.
pub fn read_to_end<S: Stream>(stream: &mut S) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

/// An in-memory, seekable, cheaply-cloneable stream over a [`Bytes`] buffer.
#[derive(Clone, Debug)]
pub struct MemoryStream {
    data: Bytes,
    pos: usize,
}

impl MemoryStream {
    pub fn new(data: impl Into<Bytes>) -> MemoryStream {
        MemoryStream { data: data.into(), pos: 0 }
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl Stream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.data.len() - self.pos;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn tell(&self) -> i64 {
        self.pos as i64
    }

    fn eos(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn substream(&self, start: i64, end: i64) -> MemoryStream {
        let start = start.max(0) as usize;
        let end = (end.max(start as i64) as usize).min(self.data.len());
        MemoryStream { data: self.data.slice(start..end), pos: 0 }
    }
}

/// Wraps a plain, non-seekable `Read` source.
///
/// `tell()` always reports `-1`; calling `substream` on one of these is a
/// logic error, since a `Parser` never requests persistent-mode content
/// from an unseekable stream.
pub struct ReadStream<R> {
    inner: R,
    eof: bool,
}

impl<R: Read> ReadStream<R> {
    pub fn new(inner: R) -> Self {
        ReadStream { inner, eof: false }
    }
}

impl<R: Read> Stream for ReadStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.eof = true;
        }
        Ok(n)
    }

    fn tell(&self) -> i64 {
        -1
    }

    fn eos(&self) -> bool {
        self.eof
    }

    fn substream(&self, _start: i64, _end: i64) -> Self {
        unreachable!("persistent-mode content is never requested from an unseekable stream")
    }
}

/// Wraps a `Read + Seek` source, optionally bounded to `[start, end)`.
///
/// Cloning the handle (via `substream`) shares the underlying reader behind
/// an `Rc<RefCell<_>>` and seeks it to the right place before each read, so
/// a tree of substreams can coexist without each owning a separate file
/// descriptor.
pub struct SeekStream<R> {
    inner: Rc<RefCell<R>>,
    start: i64,
    end: Option<i64>,
    pos: i64,
    eof_seen: bool,
}

impl<R: Read + Seek> SeekStream<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let start = inner.stream_position()? as i64;
        Ok(SeekStream { inner: Rc::new(RefCell::new(inner)), start, end: None, pos: 0, eof_seen: false })
    }
}

impl<R: Read + Seek> Stream for SeekStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = match self.end {
            Some(end) => {
                let remaining = (end - (self.start + self.pos)).max(0) as usize;
                buf.len().min(remaining)
            }
            None => buf.len(),
        };
        if want == 0 {
            return Ok(0);
        }
        let mut inner = self.inner.borrow_mut();
        inner.seek(SeekFrom::Start((self.start + self.pos) as u64))?;
        let n = inner.read(&mut buf[..want])?;
        drop(inner);
        self.pos += n as i64;
        if n == 0 && self.end.is_none() {
            self.eof_seen = true;
        }
        Ok(n)
    }

    fn tell(&self) -> i64 {
        self.start + self.pos
    }

    fn eos(&self) -> bool {
        match self.end {
            Some(end) => self.start + self.pos >= end,
            None => self.eof_seen,
        }
    }

    fn substream(&self, start: i64, end: i64) -> Self {
        SeekStream { inner: Rc::clone(&self.inner), start, end: Some(end), pos: 0, eof_seen: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stream_substream_is_bounded() {
        let mut s = MemoryStream::new(&b"hello world"[..]);
        let mut sub = s.substream(6, 11);
        let bytes = read_to_end(&mut sub).unwrap();
        assert_eq!(&bytes, b"world");
        assert_eq!(s.tell(), 0);
    }

    #[test]
    fn read_stream_reports_unknown_position() {
        let mut s = ReadStream::new(&b"abc"[..]);
        assert_eq!(s.tell(), -1);
        let bytes = read_to_end(&mut s).unwrap();
        assert_eq!(&bytes, b"abc");
        assert!(s.eos());
    }
}
