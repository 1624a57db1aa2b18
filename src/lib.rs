// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A streaming, offset-preserving parser for Internet Message Format
//! (RFC 5322) and MIME (RFC 2045-2049) content.
//!
//! [`Parser`] reads from any [`Stream`] implementation and exposes both a
//! low-level pull interface (`step`/`unstep`) and high-level constructors
//! (`construct_part`, `construct_message`) that build a tree of parts via
//! a caller-supplied [`ObjectFactory`]. [`tree::NodeFactory`] is a
//! ready-to-use factory for callers who just want a plain owned tree.
//!
//! Content is never required to be buffered in memory: when the source
//! stream is seekable, leaf content is represented as bounded substreams
//! (`ContentSpan::Persistent`) instead of copies, and every header and
//! part carries the absolute byte offset at which it began.
//!
//! [`mbox`] drives the parser across a sequence of mbox-delimited
//! messages; [`signed`] canonicalizes `multipart/signed` content the way
//! a signer or verifier needs to see it, without implementing any
//! cryptography itself.

pub mod content_type;
pub mod error;
pub mod factory;
pub mod mbox;
pub mod parser;
pub mod signed;
pub mod tree;

mod boundary;
mod buffer;
mod headers;
mod stream;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use factory::{ContentSpan, ObjectFactory};
pub use headers::RawHeader;
pub use parser::{Parser, ParserState};
pub use stream::{read_to_end, MemoryStream, ReadStream, SeekStream, Stream};
pub use tree::{LeafContent, MimeNode, NodeFactory};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_message_end_to_end() {
        let data = b"From: a@example.com\r\nTo: b@example.com\r\nSubject: hi\r\nContent-Type: text/plain\r\n\r\nhello\r\n";
        let mut parser = Parser::new(MemoryStream::new(&data[..]));
        let mut factory = NodeFactory;
        let node = parser.construct_part(&mut factory).unwrap().unwrap();
        assert_eq!(node.content_type(), "text/plain");
        assert!(parser.eof());
    }
}
