// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Reading a sequence of messages out of an mbox-format file: each message
//! introduced by a `From ` line at the start of its own physical line, with
//! an optional `Content-Length` header bounding where its body actually
//! ends when later messages themselves contain lines that start with
//! `From `.
//!
//! This is a thin driver over [`crate::parser::Parser`]'s `scan_from` and
//! `respect_content_length` options, repeatedly calling
//! [`crate::parser::Parser::construct_message`] until the stream is
//! exhausted.

use bytes::Bytes;

use crate::error::Result;
use crate::factory::ObjectFactory;
use crate::parser::Parser;
use crate::stream::Stream;

/// Iterates over the messages in an mbox stream, yielding each message
/// together with the "From " line (and its offset) that introduced it.
pub struct MboxReader<S, F> {
    parser: Parser<S>,
    factory: F,
}

impl<S: Stream, F: ObjectFactory<S>> MboxReader<S, F> {
    /// `respect_content_length` controls whether a message's own
    /// `Content-Length` header is trusted to bound its body; when it is
    /// not, only the next `From ` line (or end of stream) ends a message.
    pub fn new(stream: S, factory: F, respect_content_length: bool) -> Self {
        let mut parser = Parser::new(stream);
        parser.set_scan_from(true);
        parser.set_respect_content_length(respect_content_length);
        MboxReader { parser, factory }
    }

    pub fn into_parts(self) -> (Parser<S>, F) {
        (self.parser, self.factory)
    }
}

impl<S: Stream, F: ObjectFactory<S>> Iterator for MboxReader<S, F> {
    type Item = Result<(F::Object, Bytes, i64)>;

    fn next(&mut self) -> Option<Result<(F::Object, Bytes, i64)>> {
        if self.parser.eof() {
            return None;
        }
        match self.parser.construct_message(&mut self.factory) {
            Ok(Some(message)) => {
                let from_line = self.parser.from_line_bytes();
                let from_offset = self.parser.from_offset();
                Some(Ok((message, from_line, from_offset)))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;
    use crate::tree::NodeFactory;

    #[test]
    fn splits_on_from_lines() {
        let data = b"From a@b Mon Jan  1 00:00:00 2024\r\nSubject: one\r\n\r\nbody one\r\nFrom c@d Tue Jan  2 00:00:00 2024\r\nSubject: two\r\n\r\nbody two\r\n";
        let reader = MboxReader::new(MemoryStream::new(&data[..]), NodeFactory, false);
        let messages: Vec<_> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(&messages[0].1[..], b"From a@b Mon Jan  1 00:00:00 2024");
        assert_eq!(messages[0].2, 0);
        assert!(&messages[1].1.starts_with(b"From c@d"));
    }

    #[test]
    fn content_length_bounds_a_body_containing_a_from_looking_line() {
        let body = b"From inside the body, not a real separator\r\nmore text\r\n";
        let data = format!(
            "From a@b Mon Jan  1 00:00:00 2024\r\nSubject: one\r\nContent-Length: {}\r\n\r\n{}From c@d Tue Jan  2 00:00:00 2024\r\nSubject: two\r\n\r\nbody two\r\n",
            body.len(),
            String::from_utf8_lossy(body)
        );
        let reader = MboxReader::new(MemoryStream::new(data.into_bytes()), NodeFactory, true);
        let messages: Vec<_> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(messages.len(), 2);
    }
}
