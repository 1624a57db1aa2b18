// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Canonicalization for `multipart/signed` content (RFC 1847, RFC 3156
//! section 5).
//!
//! A signature is computed over, and must be verified against, the exact
//! canonical byte sequence a cooperating mail client would transmit on the
//! wire: CRLF line endings throughout, any line that would otherwise be
//! mistaken for an mbox `From ` separator escaped with a leading `>`, and
//! trailing whitespace stripped from every line. The three filters below
//! produce that canonical form one `Write` call at a time; this module
//! does not sign or verify anything itself, since that requires a
//! cryptographic backend this crate has no opinion about.

use std::io::{self, Write};

use crate::content_type;
use crate::error::{Error, Result};
use crate::headers;
use crate::tree::MimeNode;

/// Splits a `multipart/signed` node into its signed content and its
/// detached signature part: the first two children. A node with more
/// than two children is tolerated and still split on its first two,
/// matching the original verifier's own `< 2` tolerance.
pub fn split<S>(node: &MimeNode<S>) -> Result<(&MimeNode<S>, &MimeNode<S>)> {
    match node {
        MimeNode::Multipart { children, .. } if children.len() >= 2 => Ok((&children[0], &children[1])),
        _ => Err(Error::MissingSignedSubparts),
    }
}

/// Reads the `boundary` parameter back out of a `multipart/signed` node's
/// own `Content-Type` header, for callers re-deriving the exact canonical
/// span a signature was computed over.
pub fn boundary_of<S>(node: &MimeNode<S>) -> Result<String> {
    let raw = headers::find(node.headers(), "Content-Type").map(|h| h.value.as_str());
    let ct = content_type::parse_or_default(raw);
    ct.get_parameter("boundary").map(|s| s.to_string()).ok_or(Error::NoContentTypeBoundary)
}

/// Normalizes line endings. `to_crlf = true` converts bare LF to CRLF
/// (preparing content for signing or transmission); `to_crlf = false`
/// converts CRLF to bare LF (preparing a received signature's content for
/// re-canonicalization before verification).
pub struct CrlfFilter<W> {
    inner: W,
    to_crlf: bool,
    pending_cr: bool,
}

impl<W: Write> CrlfFilter<W> {
    pub fn new(inner: W, to_crlf: bool) -> Self {
        CrlfFilter { inner, to_crlf, pending_cr: false }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            match b {
                b'\r' => {
                    if self.pending_cr {
                        self.inner.write_all(b"\r")?;
                    }
                    self.pending_cr = true;
                }
                b'\n' => {
                    if !self.to_crlf {
                        self.inner.write_all(b"\n")?;
                    } else {
                        self.inner.write_all(b"\r\n")?;
                    }
                    self.pending_cr = false;
                }
                _ => {
                    if self.pending_cr {
                        self.inner.write_all(b"\r")?;
                        self.pending_cr = false;
                    }
                    self.inner.write_all(&[b])?;
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending_cr {
            self.inner.write_all(b"\r")?;
            self.pending_cr = false;
        }
        self.inner.flush()
    }
}

/// Escapes any line beginning with `From ` by prepending `>`. Operates a
/// line at a time, buffering only until the next `\n`.
pub struct FromArmorFilter<W> {
    inner: W,
    line: Vec<u8>,
}

impl<W: Write> FromArmorFilter<W> {
    pub fn new(inner: W) -> Self {
        FromArmorFilter { inner, line: Vec::new() }
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush_line()?;
        Ok(self.inner)
    }

    fn flush_line(&mut self) -> io::Result<()> {
        let mut rest = &self.line[..];
        while rest.starts_with(b">") {
            rest = &rest[1..];
        }
        if rest.starts_with(b"From ") {
            self.inner.write_all(b">")?;
        }
        self.inner.write_all(&self.line)?;
        self.line.clear();
        Ok(())
    }
}

impl<W: Write> Write for FromArmorFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            self.line.push(b);
            if b == b'\n' {
                self.flush_line()?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Strips trailing space/tab bytes immediately before each line
/// terminator.
pub struct TrailingWhitespaceStripFilter<W> {
    inner: W,
    line: Vec<u8>,
}

impl<W: Write> TrailingWhitespaceStripFilter<W> {
    pub fn new(inner: W) -> Self {
        TrailingWhitespaceStripFilter { inner, line: Vec::new() }
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush_line(false)?;
        Ok(self.inner)
    }

    fn flush_line(&mut self, had_newline: bool) -> io::Result<()> {
        let body = if had_newline { &self.line[..self.line.len() - 1] } else { &self.line[..] };
        let trimmed_len = body.iter().rposition(|&b| b != b' ' && b != b'\t').map_or(0, |i| i + 1);
        self.inner.write_all(&body[..trimmed_len])?;
        if had_newline {
            self.inner.write_all(b"\n")?;
        }
        self.line.clear();
        Ok(())
    }
}

impl<W: Write> Write for TrailingWhitespaceStripFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            self.line.push(b);
            if b == b'\n' {
                self.flush_line(true)?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn canonicalize(data: &[u8]) -> Vec<u8> {
        let strip = TrailingWhitespaceStripFilter::new(Vec::new());
        let mut armor = FromArmorFilter::new(strip);
        armor.write_all(data).unwrap();
        let strip = armor.into_inner().unwrap();
        let stripped = strip.into_inner().unwrap();
        let mut crlf = CrlfFilter::new(Vec::new(), true);
        crlf.write_all(&stripped).unwrap();
        crlf.flush().unwrap();
        crlf.into_inner()
    }

    #[test]
    fn normalizes_to_crlf() {
        let out = canonicalize(b"one\ntwo\r\nthree\n");
        assert_eq!(&out[..], b"one\r\ntwo\r\nthree\r\n");
    }

    #[test]
    fn escapes_from_lines() {
        let out = canonicalize(b"From the start\nnot from\n>From already quoted\n");
        assert_eq!(&out[..], b">From the start\r\nnot from\r\n>>From already quoted\r\n");
    }

    #[test]
    fn strips_trailing_whitespace_but_keeps_leading() {
        let out = canonicalize(b"  leading kept, trailing gone   \nsecond\t\n");
        assert_eq!(&out[..], b"  leading kept, trailing gone\r\nsecond\r\n");
    }

    #[test]
    fn split_requires_at_least_two_children() {
        let leaf = |ct: &str| MimeNode::<crate::stream::MemoryStream>::Leaf {
            headers: Vec::new(),
            raw_headers: Bytes::new(),
            content_type: ct.to_string(),
            encoding: None,
            content: crate::tree::LeafContent::Buffered(Bytes::new()),
        };
        let multipart = |children| MimeNode::Multipart {
            headers: Vec::new(),
            raw_headers: Bytes::new(),
            content_type: "multipart/signed".to_string(),
            preface: Bytes::new(),
            children,
            postface: Bytes::new(),
        };

        let node = multipart(vec![leaf("text/plain"), leaf("application/pgp-signature")]);
        let (content, sig) = split(&node).unwrap();
        assert_eq!(content.content_type(), "text/plain");
        assert_eq!(sig.content_type(), "application/pgp-signature");

        // A signer that emitted a trailing third part is tolerated; the
        // first two children still win.
        let node = multipart(vec![
            leaf("text/plain"),
            leaf("application/pgp-signature"),
            leaf("text/plain"),
        ]);
        let (content, sig) = split(&node).unwrap();
        assert_eq!(content.content_type(), "text/plain");
        assert_eq!(sig.content_type(), "application/pgp-signature");

        let not_signed = leaf("text/plain");
        assert!(matches!(split(&not_signed), Err(Error::MissingSignedSubparts)));
    }

    #[test]
    fn boundary_of_reads_content_type_parameter() {
        use crate::headers::RawHeader;
        let node = MimeNode::<crate::stream::MemoryStream>::Multipart {
            headers: vec![RawHeader {
                name: "Content-Type".to_string(),
                value: "multipart/signed; boundary=XYZ".to_string(),
                offset: 0,
            }],
            raw_headers: Bytes::new(),
            content_type: "multipart/signed".to_string(),
            preface: Bytes::new(),
            children: Vec::new(),
            postface: Bytes::new(),
        };
        assert_eq!(boundary_of(&node).unwrap(), "XYZ");
    }
}
