// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The sliding, sentinel-terminated scan buffer the parser reads through.
//!
//! Rather than handing out raw pointers the way a C parser would, this
//! keeps everything index-based into a single `Vec<u8>`: `inptr` and
//! `inend` bound the unconsumed region, and `fill()` compacts consumed
//! bytes out of the way before reading more. A `\n` sentinel is written one
//! byte past `inend` after every successful fill so line-scanning loops
//! never need a bounds check on every byte, only a check against the
//! sentinel afterwards.

use std::io;

use crate::stream::Stream;

/// Size of the region `fill()` tries to keep read ahead.
pub(crate) const SCAN_BUF: usize = 4096;
/// Slack kept at the front of the buffer so a compaction never has to move
/// data it could instead leave in place.
pub(crate) const SCAN_HEAD: usize = 128;

pub(crate) struct InputBuffer<S> {
    stream: S,
    data: Vec<u8>,
    inptr: usize,
    inend: usize,
    absolute_offset: i64,
    seekable: bool,
    stream_eof: bool,
}

impl<S: Stream> InputBuffer<S> {
    pub fn new(stream: S) -> Self {
        let absolute_offset = stream.tell();
        let seekable = absolute_offset != -1;
        InputBuffer {
            stream,
            data: vec![0u8; SCAN_HEAD + SCAN_BUF + 1],
            inptr: 0,
            inend: 0,
            absolute_offset,
            seekable,
            stream_eof: false,
        }
    }

    pub fn seekable(&self) -> bool {
        self.seekable
    }

    pub fn inptr(&self) -> usize {
        self.inptr
    }

    pub fn inend(&self) -> usize {
        self.inend
    }

    pub fn set_inptr(&mut self, p: usize) {
        debug_assert!(p <= self.inend);
        self.inptr = p;
    }

    #[inline]
    pub fn byte(&self, idx: usize) -> u8 {
        self.data[idx]
    }

    #[inline]
    pub fn bytes(&self, range: std::ops::Range<usize>) -> &[u8] {
        &self.data[range]
    }

    /// Writes the scan sentinel just past the unconsumed region. Every
    /// `while buf.byte(i) != b'\n' { i += 1 }` loop relies on this being
    /// fresh, so it must be called again after each `fill()`.
    pub fn sentinel(&mut self) {
        self.data[self.inend] = b'\n';
    }

    /// Translates a buffer index into an absolute stream offset, or `-1`
    /// if the underlying stream isn't seekable.
    pub fn offset_of(&self, p: usize) -> i64 {
        if !self.seekable {
            return -1;
        }
        self.absolute_offset - (self.inend - p) as i64
    }

    pub fn tell(&self) -> i64 {
        self.offset_of(self.inptr)
    }

    pub fn eof(&self) -> bool {
        self.stream_eof && self.inptr == self.inend
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Compacts consumed bytes out of the way and reads more from the
    /// stream if there's room. Returns the number of unread bytes
    /// currently buffered; a return of `0` means the stream is genuinely
    /// exhausted, not just that this particular call didn't read anything.
    pub fn fill(&mut self) -> io::Result<usize> {
        if self.inptr > 0 {
            self.data.copy_within(self.inptr..self.inend, 0);
            self.inend -= self.inptr;
            self.inptr = 0;
        }
        if !self.stream_eof {
            let cap = self.data.len() - 1;
            if self.inend < cap {
                let n = self.stream.read(&mut self.data[self.inend..cap])?;
                if n == 0 {
                    self.stream_eof = true;
                } else {
                    self.inend += n;
                }
            }
            self.absolute_offset = self.stream.tell();
        }
        Ok(self.inend - self.inptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    #[test]
    fn fill_compacts_and_reads() {
        let mut buf = InputBuffer::new(MemoryStream::new(&b"hello\nworld\n"[..]));
        let n = buf.fill().unwrap();
        assert_eq!(n, 12);
        buf.sentinel();
        assert_eq!(buf.byte(buf.inend()), b'\n');
        buf.set_inptr(6);
        let n = buf.fill().unwrap();
        assert_eq!(n, 6);
        assert_eq!(buf.bytes(buf.inptr()..buf.inend()), b"world\n");
    }

    #[test]
    fn eof_is_sticky() {
        let mut buf = InputBuffer::new(MemoryStream::new(&b"hi"[..]));
        buf.fill().unwrap();
        buf.set_inptr(buf.inend());
        let n = buf.fill().unwrap();
        assert_eq!(n, 0);
        assert!(buf.eof());
    }
}
