// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The state machine that drives everything else: a sliding-window,
//! pull-model scanner over an arbitrary byte stream that recognises
//! RFC 5322 headers and MIME boundaries while tracking absolute stream
//! offsets, and the part/message constructors built on top of it.
//!
//! `step()`/`unstep()` form the low-level pull interface; `construct_part`
//! and `construct_message` are the high-level entry points most callers
//! actually want. The constructors never reinspect already-scanned state
//! through `step()` themselves — each one either drives the state machine
//! once at its own entry point or assumes its caller already did.

use std::io;

use bytes::{Bytes, BytesMut};
use regex::RegexBuilder;

use crate::boundary::{BoundaryStack, ScanOutcome};
use crate::buffer::InputBuffer;
use crate::content_type::{self, ContentType};
use crate::factory::{ContentSpan, ObjectFactory};
use crate::headers::{self, RawHeader};
use crate::stream::Stream;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Init,
    From,
    Headers,
    HeadersEnd,
    Content,
    Error,
}

struct ScanResult {
    outcome: ScanOutcome,
    crlf: usize,
    start_offset: i64,
    end_offset: i64,
}

/// Normalizes embedded CRLF sequences to bare LF, in place. Used for
/// multipart preface/postface text, which is treated as display text
/// rather than opaque content.
fn crlf_to_lf(data: &mut Vec<u8>) {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && i + 1 < data.len() && data[i + 1] == b'\n' {
            i += 1;
            continue;
        }
        out.push(data[i]);
        i += 1;
    }
    *data = out;
}

pub struct Parser<S> {
    state: ParserState,
    buf: InputBuffer<S>,
    unstep_count: u32,
    midline: bool,

    scan_from: bool,
    respect_content_length: bool,
    persist_stream: bool,

    header_regex: Option<regex::Regex>,
    header_cb: Option<Box<dyn FnMut(&str, &str, i64)>>,

    headers: Vec<RawHeader>,
    raw_headers: BytesMut,
    headers_start: i64,
    header_start: i64,

    from_line: Option<Bytes>,
    from_offset: i64,

    bounds: BoundaryStack,
}

impl<S: Stream> Parser<S> {
    pub fn new(stream: S) -> Self {
        Parser {
            state: ParserState::Init,
            buf: InputBuffer::new(stream),
            unstep_count: 0,
            midline: false,
            scan_from: false,
            respect_content_length: false,
            persist_stream: true,
            header_regex: None,
            header_cb: None,
            headers: Vec::new(),
            raw_headers: BytesMut::new(),
            headers_start: -1,
            header_start: -1,
            from_line: None,
            from_offset: -1,
            bounds: BoundaryStack::new(),
        }
    }

    /// Resets the parser to scan a new stream from the beginning, as if
    /// freshly constructed.
    pub fn init_with_stream(&mut self, stream: S) {
        *self = Parser::new(stream);
    }

    pub fn scan_from(&self) -> bool {
        self.scan_from
    }

    pub fn set_scan_from(&mut self, enabled: bool) {
        self.scan_from = enabled;
    }

    pub fn respect_content_length(&self) -> bool {
        self.respect_content_length
    }

    pub fn set_respect_content_length(&mut self, enabled: bool) {
        self.respect_content_length = enabled;
    }

    /// Whether content will actually be stored as substream references
    /// rather than copied. This is the AND of the caller's preference and
    /// the stream's own seekability — persistent mode is silently
    /// unavailable on an unseekable stream.
    pub fn persist_stream(&self) -> bool {
        self.persist_stream && self.buf.seekable()
    }

    pub fn set_persist_stream(&mut self, enabled: bool) {
        self.persist_stream = enabled;
    }

    /// Installs (or clears, by passing `None` for both) a callback invoked
    /// for every header whose name matches `pattern`. Matching is
    /// case-insensitive.
    pub fn set_header_regex(&mut self, pattern: Option<&str>, callback: Option<Box<dyn FnMut(&str, &str, i64)>>) -> Result<()> {
        match (pattern, callback) {
            (Some(pattern), Some(cb)) => {
                let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
                self.header_regex = Some(re);
                self.header_cb = Some(cb);
            }
            _ => {
                self.header_regex = None;
                self.header_cb = None;
            }
        }
        Ok(())
    }

    pub fn tell(&self) -> i64 {
        self.buf.tell()
    }

    pub fn eof(&self) -> bool {
        self.buf.eof()
    }

    /// The most recently scanned mbox "From " line, if `scan_from` is
    /// enabled and one has been seen.
    pub fn from_line(&self) -> Option<&[u8]> {
        if self.scan_from {
            self.from_line.as_deref()
        } else {
            None
        }
    }

    /// Like [`Parser::from_line`], but an owned, cheaply-cloned `Bytes`
    /// (empty when there is none), for callers that want to carry it past
    /// the parser's own borrow.
    pub fn from_line_bytes(&self) -> Bytes {
        if self.scan_from {
            self.from_line.clone().unwrap_or_default()
        } else {
            Bytes::new()
        }
    }

    pub fn from_offset(&self) -> i64 {
        if self.scan_from {
            self.from_offset
        } else {
            -1
        }
    }

    pub fn headers_start_offset(&self) -> i64 {
        self.headers_start
    }

    /// Advances the state machine by one logical step, unless a prior
    /// `unstep()` call is still outstanding, in which case this just
    /// replays the current state without doing any work.
    pub fn step(&mut self) -> io::Result<ParserState> {
        if self.unstep_count > 0 {
            self.unstep_count -= 1;
            return Ok(self.state);
        }

        loop {
            match self.state {
                ParserState::Init => {
                    self.state = if self.scan_from { ParserState::From } else { ParserState::Headers };
                    continue;
                }
                ParserState::From => {
                    self.step_from()?;
                    break;
                }
                ParserState::Headers => {
                    self.step_headers()?;
                    break;
                }
                ParserState::HeadersEnd | ParserState::Content | ParserState::Error => break,
            }
        }
        Ok(self.state)
    }

    /// Causes the next `step()` call to replay the current state instead
    /// of advancing. Calls nest: two `unstep()` calls require two `step()`
    /// calls to work through before the state machine advances again.
    pub fn unstep(&mut self) {
        self.unstep_count += 1;
    }

    /// Drives the header lexer directly, bypassing FROM-line scanning.
    /// Used both as a public low-level entry point and internally, for
    /// subpart and nested-message header scans that should never attempt
    /// to rescan for a "From " line mid-stream.
    pub fn step_headers_only(&mut self) -> io::Result<ParserState> {
        self.state = ParserState::Headers;
        self.drive_to_headers_end()
    }

    fn drive_to_headers_end(&mut self) -> io::Result<ParserState> {
        loop {
            match self.step()? {
                s @ (ParserState::HeadersEnd | ParserState::Error) => return Ok(s),
                _ => {}
            }
        }
    }

    fn step_from(&mut self) -> io::Result<()> {
        self.from_line = None;
        let mut left: usize = 0;

        loop {
            let avail = self.buf.fill()?;
            if avail <= left {
                self.state = ParserState::Error;
                let inend = self.buf.inend();
                self.buf.set_inptr(inend);
                return Ok(());
            }
            self.buf.sentinel();
            let inend = self.buf.inend();
            let mut inptr = self.buf.inptr();
            let mut need_refill = false;

            while inptr < inend {
                let start = inptr;
                while self.buf.byte(inptr) != b'\n' {
                    inptr += 1;
                }
                if inptr + 1 >= inend {
                    left = inend - start;
                    self.buf.set_inptr(start);
                    need_refill = true;
                    break;
                }
                let len = inptr - start;
                inptr += 1;
                if len >= 5 && self.buf.bytes(start..start + 5) == b"From " {
                    self.from_offset = self.buf.offset_of(start);
                    self.from_line = Some(Bytes::copy_from_slice(self.buf.bytes(start..start + len)));
                    self.buf.set_inptr(inptr);
                    self.state = ParserState::Headers;
                    return Ok(());
                }
            }

            if !need_refill {
                self.buf.set_inptr(inptr);
                left = 0;
            }
        }
    }

    fn step_headers(&mut self) -> io::Result<()> {
        self.midline = false;
        self.headers.clear();
        self.raw_headers.clear();
        self.headers_start = self.buf.tell();
        self.header_start = self.buf.tell();

        let mut header_buf: Vec<u8> = Vec::new();
        let mut left: usize = 0;

        'scan: loop {
            let avail = self.buf.fill()?;
            if avail <= left {
                break 'scan;
            }
            self.buf.sentinel();
            let inend = self.buf.inend();
            let mut inptr = self.buf.inptr();

            while inptr < inend {
                let start = inptr;
                while self.buf.byte(inptr) != b'\n' {
                    inptr += 1;
                }

                self.raw_headers.extend_from_slice(self.buf.bytes(start..inptr));

                if inptr == inend {
                    header_buf.extend_from_slice(self.buf.bytes(start..inptr));
                    self.midline = true;
                    left = 0;
                    self.buf.set_inptr(inptr);
                    continue 'scan;
                }

                let is_blank =
                    !self.midline && (inptr == start || (inptr - start == 1 && self.buf.byte(start) == b'\r'));
                if is_blank {
                    // the blank line's own terminator is left unconsumed;
                    // callers skip it explicitly once headers are done.
                    self.buf.set_inptr(inptr);
                    return self.finish_headers(header_buf);
                }

                let mut len = inptr - start;
                if len > 0 && self.buf.byte(inptr - 1) == b'\r' {
                    len -= 1;
                }
                header_buf.extend_from_slice(self.buf.bytes(start..start + len));
                self.raw_headers.extend_from_slice(self.buf.bytes(inptr..inptr + 1));
                inptr += 1;

                if inptr < inend && (self.buf.byte(inptr) == b' ' || self.buf.byte(inptr) == b'\t') {
                    self.midline = true;
                } else {
                    self.midline = false;
                    self.parse_header(&header_buf);
                    header_buf.clear();
                    self.header_start = self.buf.offset_of(inptr);
                }
            }

            left = inend - inptr;
            self.buf.set_inptr(inptr);
        }

        let inptr = self.buf.inptr();
        let inend = self.buf.inend();
        header_buf.extend_from_slice(self.buf.bytes(inptr..inend));
        self.raw_headers.extend_from_slice(self.buf.bytes(inptr..inend));
        self.buf.set_inptr(inend);
        self.finish_headers(header_buf)
    }

    fn finish_headers(&mut self, mut header_buf: Vec<u8>) -> io::Result<()> {
        if !header_buf.is_empty() {
            self.parse_header(&header_buf);
            header_buf.clear();
        }
        self.state = ParserState::HeadersEnd;
        Ok(())
    }

    fn parse_header(&mut self, header_buf: &[u8]) {
        let colon = header_buf.iter().position(|&b| b == b':');
        let (name, value) = match colon {
            Some(idx) => {
                let name = String::from_utf8_lossy(&header_buf[..idx]).trim().to_string();
                let value = String::from_utf8_lossy(&header_buf[idx + 1..]).trim().to_string();
                (name, value)
            }
            None => {
                let value = String::from_utf8_lossy(header_buf).trim().to_string();
                log::warn!("header line has no colon, treating as X-Invalid-Header: {:?}", value);
                ("X-Invalid-Header".to_string(), value)
            }
        };

        let offset = self.header_start;

        if let Some(re) = &self.header_regex {
            if re.is_match(&name) {
                if let Some(cb) = &mut self.header_cb {
                    cb(&name, &value, offset);
                }
            }
        }

        self.headers.push(RawHeader { name, value, offset });
    }

    fn take_raw_headers(&mut self) -> Bytes {
        std::mem::take(&mut self.raw_headers).freeze()
    }

    /// Skips past the remainder of the current line. Used to consume a
    /// boundary marker or the blank line left unconsumed after headers.
    fn skip_line(&mut self) -> io::Result<()> {
        let mut inptr = self.buf.inptr();
        loop {
            if self.buf.fill()? == 0 {
                inptr = self.buf.inptr();
                break;
            }
            self.buf.sentinel();
            let inend = self.buf.inend();
            inptr = self.buf.inptr();
            while self.buf.byte(inptr) != b'\n' {
                inptr += 1;
            }
            if inptr < inend {
                break;
            }
            self.buf.set_inptr(inptr);
        }
        self.midline = false;
        let inend = self.buf.inend();
        self.buf.set_inptr((inptr + 1).min(inend));
        Ok(())
    }

    fn check_boundary(&self, start: usize, len: usize) -> Option<ScanOutcome> {
        let mut len = len;
        if len > 0 && self.buf.byte(start + len - 1) == b'\r' {
            len -= 1;
        }
        let offset = self.buf.offset_of(start);
        let line = self.buf.bytes(start..start + len);
        self.bounds.check(line, offset, self.scan_from)
    }

    fn scan_content(&mut self, mut sink: Option<&mut Vec<u8>>) -> io::Result<ScanResult> {
        self.midline = false;
        let start_offset = self.buf.tell();
        let mut start = self.buf.inptr();
        let mut inptr = start;
        let mut outcome: Option<ScanOutcome> = None;

        loop {
            let nleft = self.buf.inend() - inptr;
            let avail = self.buf.fill()?;
            if avail == 0 {
                start = self.buf.inptr();
                outcome = Some(ScanOutcome::Eos);
                break;
            }
            self.buf.sentinel();
            let inend = self.buf.inend();
            inptr = self.buf.inptr();

            if self.midline && inend - inptr == nleft {
                outcome = Some(ScanOutcome::Eos);
            }
            self.midline = false;

            let mut need_refill = false;
            while inptr < inend {
                start = inptr;
                while self.buf.byte(inptr) != b'\n' {
                    inptr += 1;
                }
                let len = inptr - start;

                if inptr < inend {
                    if let Some(o) = self.check_boundary(start, len) {
                        outcome = Some(o);
                        break;
                    }
                    inptr += 1;
                    if let Some(s) = sink.as_deref_mut() {
                        s.extend_from_slice(self.buf.bytes(start..inptr));
                    }
                } else {
                    self.midline = true;
                    if outcome.is_none() {
                        self.buf.set_inptr(start);
                        inptr = start;
                        need_refill = true;
                        break;
                    }
                    if let Some(o) = self.check_boundary(start, len) {
                        outcome = Some(o);
                        break;
                    }
                    if let Some(s) = sink.as_deref_mut() {
                        s.extend_from_slice(self.buf.bytes(start..inptr));
                    }
                }
            }

            if need_refill {
                continue;
            }
            if outcome.is_some() {
                break;
            }
            self.buf.set_inptr(inptr);
        }

        let found = outcome.unwrap();
        self.buf.set_inptr(start);

        let crlf = if found != ScanOutcome::Eos {
            if inptr > start && self.buf.byte(inptr - 1) == b'\r' {
                2
            } else {
                1
            }
        } else {
            0
        };

        Ok(ScanResult { outcome: found, crlf, start_offset, end_offset: self.buf.tell() })
    }

    /// Scans a multipart preface or postface: plain display text, trimmed
    /// of its trailing boundary-adjacent terminator and CRLF-normalized.
    fn scan_face(&mut self) -> io::Result<(ScanOutcome, Bytes)> {
        let mut raw = Vec::new();
        let result = self.scan_content(Some(&mut raw))?;
        let keep = raw.len().saturating_sub(result.crlf);
        raw.truncate(keep);
        crlf_to_lf(&mut raw);
        Ok((result.outcome, Bytes::from(raw)))
    }

    fn current_line_is_own_end_boundary(&self) -> bool {
        let inptr = self.buf.inptr();
        let avail = self.buf.inend() - inptr;
        self.bounds.top_is_end_boundary(self.buf.bytes(inptr..inptr + avail))
    }

    /// Scans the current object's headers into a fresh object created by
    /// `new_obj`, attaches the raw header block, and skips the blank line
    /// terminating the header block. Assumes the header lexer has already
    /// reached `HeadersEnd`.
    fn construct_headers_object<F: ObjectFactory<S>, N>(&mut self, factory: &mut F, new_obj: N) -> io::Result<(F::Object, ContentType, Vec<RawHeader>)>
    where
        N: FnOnce(&mut F, &ContentType) -> F::Object,
    {
        let content_type = content_type::parse_or_default(headers::find(&self.headers, "Content-Type").map(|h| h.value.as_str()));
        let headers = std::mem::take(&mut self.headers);
        let raw_headers = self.take_raw_headers();

        let mut obj = new_obj(factory, &content_type);
        for h in &headers {
            factory.add_header(&mut obj, &h.name, &h.value, h.offset);
        }
        factory.set_raw_headers(&mut obj, raw_headers);

        self.skip_line()?;
        Ok((obj, content_type, headers))
    }

    fn scan_leaf_content<F: ObjectFactory<S>>(
        &mut self,
        factory: &mut F,
        obj: &mut F::Object,
        headers: &[RawHeader],
    ) -> io::Result<ScanOutcome> {
        let encoding = headers::find(headers, "Content-Transfer-Encoding").map(|h| h.value.trim().to_string());
        let persistent = self.persist_stream();
        let mut raw = if persistent { None } else { Some(Vec::new()) };

        let result = self.scan_content(raw.as_mut())?;

        let content = if persistent {
            let end = result.end_offset - result.crlf as i64;
            ContentSpan::Persistent(self.buf.stream().substream(result.start_offset, end))
        } else {
            let mut v = raw.unwrap();
            let keep = v.len().saturating_sub(result.crlf);
            v.truncate(keep);
            ContentSpan::Buffered(Bytes::from(v))
        };

        factory.set_leaf_content(obj, content, encoding);
        Ok(result.outcome)
    }

    fn construct_multipart_body<F: ObjectFactory<S>>(
        &mut self,
        factory: &mut F,
        obj: &mut F::Object,
        content_type: &ContentType,
    ) -> io::Result<ScanOutcome> {
        let boundary = content_type.get_parameter("boundary").map(|s| s.to_string());

        let Some(boundary) = boundary else {
            log::warn!("multipart {} has no boundary parameter; scanning all remaining content as preface", content_type.essence());
            let (found, preface) = self.scan_face()?;
            factory.finish_multipart(obj, preface, Vec::new(), Bytes::new());
            return Ok(found);
        };

        self.bounds.push_boundary(&boundary);
        let (mut found, preface) = self.scan_face()?;

        let mut children = Vec::new();
        let mut postface = Bytes::new();

        if found == ScanOutcome::Boundary {
            let (kids, outcome) = self.scan_multipart_subparts(factory)?;
            children = kids;
            found = outcome;
        }

        if found == ScanOutcome::EndBoundary && self.current_line_is_own_end_boundary() {
            self.skip_line()?;
            self.bounds.pop();
            let (outcome, pf) = self.scan_face()?;
            postface = pf;
            found = outcome;
        } else {
            self.bounds.pop();
        }

        factory.finish_multipart(obj, preface, children, postface);
        Ok(found)
    }

    fn scan_multipart_subparts<F: ObjectFactory<S>>(&mut self, factory: &mut F) -> io::Result<(Vec<F::Object>, ScanOutcome)> {
        let mut children = Vec::new();
        loop {
            self.skip_line()?;
            if self.step_headers_only()? == ParserState::Error {
                return Ok((children, ScanOutcome::Eos));
            }
            let (child, found) = self.construct_dispatched(factory)?;
            children.push(child);
            if found != ScanOutcome::Boundary {
                return Ok((children, found));
            }
        }
    }

    fn fill_body<F: ObjectFactory<S>>(
        &mut self,
        factory: &mut F,
        obj: &mut F::Object,
        content_type: &ContentType,
        headers_for_leaf: &[RawHeader],
    ) -> io::Result<ScanOutcome> {
        if content_type.is_type("multipart", "*") {
            self.construct_multipart_body(factory, obj, content_type)
        } else if factory.is_message_part(content_type) {
            let (inner, found) = self.construct_nested_message(factory)?;
            if let Some(inner) = inner {
                factory.set_nested_message(obj, inner);
            }
            Ok(found)
        } else {
            self.scan_leaf_content(factory, obj, headers_for_leaf)
        }
    }

    fn construct_dispatched<F: ObjectFactory<S>>(&mut self, factory: &mut F) -> io::Result<(F::Object, ScanOutcome)> {
        let (mut obj, content_type, headers) = self.construct_headers_object(factory, |f, ct| f.new_object(ct))?;
        let found = self.fill_body(factory, &mut obj, &content_type, &headers)?;
        Ok((obj, found))
    }

    fn construct_nested_message<F: ObjectFactory<S>>(&mut self, factory: &mut F) -> io::Result<(Option<F::Object>, ScanOutcome)> {
        if self.step_headers_only()? == ParserState::Error {
            return Ok((None, ScanOutcome::Eos));
        }
        let (mut message, content_type, headers) = self.construct_headers_object(factory, |f, _ct| f.new_message())?;
        let mut body_obj = factory.new_object(&content_type);
        let found = self.fill_body(factory, &mut body_obj, &content_type, &headers)?;
        factory.set_message_body(&mut message, body_obj);
        Ok((Some(message), found))
    }

    /// Constructs a single MIME part (leaf, multipart, or message-part)
    /// from the stream, starting at the current position.
    pub fn construct_part<F: ObjectFactory<S>>(&mut self, factory: &mut F) -> io::Result<Option<F::Object>> {
        if self.drive_to_headers_end()? == ParserState::Error {
            return Ok(None);
        }
        let (obj, _found) = self.construct_dispatched(factory)?;
        Ok(Some(obj))
    }

    /// Constructs a top-level message: optionally scanning a leading
    /// mbox "From " line, then headers, then a body part. When
    /// `scan_from` is enabled, leaves the parser positioned to scan the
    /// next message's "From " line on return.
    pub fn construct_message<F: ObjectFactory<S>>(&mut self, factory: &mut F) -> io::Result<Option<F::Object>> {
        if self.drive_to_headers_end()? == ParserState::Error {
            return Ok(None);
        }

        let mut content_length: Option<i64> = None;
        if self.respect_content_length && self.scan_from {
            if let Some(h) = headers::find(&self.headers, "Content-Length") {
                content_length = h.value.trim().parse::<i64>().ok();
            }
        }

        let (mut message, content_type, headers) = self.construct_headers_object(factory, |f, _ct| f.new_message())?;

        if self.scan_from {
            self.bounds.push_from();
            if let Some(len) = content_length {
                self.bounds.set_top_content_end(self.buf.tell() + len);
            }
        }

        let mut body_obj = factory.new_object(&content_type);
        let _found = self.fill_body(factory, &mut body_obj, &content_type, &headers)?;
        factory.set_message_body(&mut message, body_obj);

        if self.scan_from {
            self.state = ParserState::From;
            self.bounds.pop();
        }

        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;
    use crate::tree::{LeafContent, MimeNode, NodeFactory};

    fn parse(data: &[u8]) -> MimeNode<MemoryStream> {
        let mut parser = Parser::new(MemoryStream::new(Bytes::copy_from_slice(data)));
        let mut factory = NodeFactory;
        parser.construct_part(&mut factory).unwrap().unwrap()
    }

    #[test]
    fn parses_simple_leaf() {
        let node = parse(b"Subject: hi\r\nContent-Type: text/plain\r\n\r\nhello world");
        assert_eq!(node.content_type(), "text/plain");
        match node {
            MimeNode::Leaf { content: LeafContent::Buffered(b), .. } => assert_eq!(&b[..], b"hello world"),
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn folds_continuation_lines() {
        let node = parse(b"Subject: one\r\n two\r\n\r\nbody");
        let h = headers::find(node.headers(), "Subject").unwrap();
        assert_eq!(h.value, "one  two");
    }

    #[test]
    fn tolerates_header_without_colon() {
        let node = parse(b"not-a-header\r\nContent-Type: text/plain\r\n\r\nx");
        let h = headers::find(node.headers(), "X-Invalid-Header").unwrap();
        assert_eq!(h.value, "not-a-header");
    }

    #[test]
    fn parses_multipart_with_preface_and_postface() {
        let raw = b"Content-Type: multipart/mixed; boundary=B\r\n\r\npreface text\r\n--B\r\n\r\nfirst part\r\n--B\r\n\r\nsecond part\r\n--B--\r\npostface text";
        let node = parse(raw);
        match node {
            MimeNode::Multipart { preface, children, postface, .. } => {
                assert_eq!(&preface[..], b"preface text");
                assert_eq!(children.len(), 2);
                assert_eq!(&postface[..], b"postface text");
            }
            _ => panic!("expected multipart"),
        }
    }

    #[test]
    fn nested_multipart_boundaries_do_not_collide() {
        let raw = b"Content-Type: multipart/mixed; boundary=OUTER\r\n\r\n--OUTER\r\nContent-Type: multipart/mixed; boundary=INNER\r\n\r\n--INNER\r\n\r\ninner body\r\n--INNER--\r\n--OUTER--\r\n";
        let node = parse(raw);
        match node {
            MimeNode::Multipart { children, .. } => {
                assert_eq!(children.len(), 1);
                match &children[0] {
                    MimeNode::Multipart { children, .. } => assert_eq!(children.len(), 1),
                    _ => panic!("expected nested multipart"),
                }
            }
            _ => panic!("expected multipart"),
        }
    }

    #[test]
    fn unterminated_boundary_at_eof_is_tolerated() {
        let raw = b"Content-Type: multipart/mixed; boundary=B\r\n\r\n--B\r\n\r\nonly part\r\n--B--";
        let node = parse(raw);
        match node {
            MimeNode::Multipart { children, .. } => assert_eq!(children.len(), 1),
            _ => panic!("expected multipart"),
        }
    }

    #[test]
    fn step_unstep_is_idempotent() {
        let mut parser = Parser::new(MemoryStream::new(Bytes::copy_from_slice(b"Subject: x\r\n\r\nbody")));
        let s1 = parser.step().unwrap();
        let offset1 = parser.tell();
        parser.unstep();
        let s2 = parser.step().unwrap();
        let offset2 = parser.tell();
        assert_eq!(s1, s2);
        assert_eq!(offset1, offset2);
    }

    #[test]
    fn header_offsets_are_absolute_stream_positions() {
        let node = parse(b"A: 1\r\nB: 2\r\n\r\nbody");
        let a = headers::find(node.headers(), "A").unwrap();
        let b = headers::find(node.headers(), "B").unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 6);
    }
}
