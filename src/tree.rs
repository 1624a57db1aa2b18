// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A ready-to-use [`ObjectFactory`] for callers who just want a plain,
//! owned tree of parts and don't need a custom object model.

use bytes::Bytes;

use crate::content_type::ContentType;
use crate::factory::{ContentSpan, ObjectFactory};
use crate::headers::RawHeader;

#[derive(Debug, Clone)]
pub enum LeafContent<S> {
    Buffered(Bytes),
    Persistent(S),
}

/// A constructed MIME object: a leaf with content, a multipart with
/// subparts, or a message wrapping a single body part.
#[derive(Debug, Clone)]
pub enum MimeNode<S> {
    Leaf {
        headers: Vec<RawHeader>,
        raw_headers: Bytes,
        content_type: String,
        encoding: Option<String>,
        content: LeafContent<S>,
    },
    Message {
        headers: Vec<RawHeader>,
        raw_headers: Bytes,
        content_type: String,
        body: Box<MimeNode<S>>,
    },
    Multipart {
        headers: Vec<RawHeader>,
        raw_headers: Bytes,
        content_type: String,
        preface: Bytes,
        children: Vec<MimeNode<S>>,
        postface: Bytes,
    },
}

impl<S> MimeNode<S> {
    pub fn headers(&self) -> &[RawHeader] {
        match self {
            MimeNode::Leaf { headers, .. } => headers,
            MimeNode::Message { headers, .. } => headers,
            MimeNode::Multipart { headers, .. } => headers,
        }
    }

    pub fn raw_headers(&self) -> &Bytes {
        match self {
            MimeNode::Leaf { raw_headers, .. } => raw_headers,
            MimeNode::Message { raw_headers, .. } => raw_headers,
            MimeNode::Multipart { raw_headers, .. } => raw_headers,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            MimeNode::Leaf { content_type, .. } => content_type,
            MimeNode::Message { content_type, .. } => content_type,
            MimeNode::Multipart { content_type, .. } => content_type,
        }
    }

    fn headers_mut(&mut self) -> &mut Vec<RawHeader> {
        match self {
            MimeNode::Leaf { headers, .. } => headers,
            MimeNode::Message { headers, .. } => headers,
            MimeNode::Multipart { headers, .. } => headers,
        }
    }

    fn raw_headers_mut(&mut self) -> &mut Bytes {
        match self {
            MimeNode::Leaf { raw_headers, .. } => raw_headers,
            MimeNode::Message { raw_headers, .. } => raw_headers,
            MimeNode::Multipart { raw_headers, .. } => raw_headers,
        }
    }

    fn blank_leaf() -> MimeNode<S> {
        MimeNode::Leaf {
            headers: Vec::new(),
            raw_headers: Bytes::new(),
            content_type: String::new(),
            encoding: None,
            content: LeafContent::Buffered(Bytes::new()),
        }
    }

    /// Replaces `self` with a blank leaf and returns the (headers,
    /// raw_headers, content_type) it carried, so a leaf-under-construction
    /// can be turned into a `Message` or `Multipart` without losing the
    /// header data already attached to it.
    fn take_meta(&mut self) -> (Vec<RawHeader>, Bytes, String) {
        match std::mem::replace(self, MimeNode::blank_leaf()) {
            MimeNode::Leaf { headers, raw_headers, content_type, .. } => (headers, raw_headers, content_type),
            MimeNode::Message { headers, raw_headers, content_type, .. } => (headers, raw_headers, content_type),
            MimeNode::Multipart { headers, raw_headers, content_type, .. } => (headers, raw_headers, content_type),
        }
    }
}

/// The default [`ObjectFactory`], producing [`MimeNode`] trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeFactory;

impl<S> ObjectFactory<S> for NodeFactory {
    type Object = MimeNode<S>;

    fn is_message_part(&self, content_type: &ContentType) -> bool {
        content_type.is_type("message", "rfc822") || content_type.is_type("message", "news")
    }

    fn new_object(&mut self, content_type: &ContentType) -> MimeNode<S> {
        MimeNode::Leaf {
            headers: Vec::new(),
            raw_headers: Bytes::new(),
            content_type: content_type.essence(),
            encoding: None,
            content: LeafContent::Buffered(Bytes::new()),
        }
    }

    fn new_message(&mut self) -> MimeNode<S> {
        MimeNode::Message {
            headers: Vec::new(),
            raw_headers: Bytes::new(),
            content_type: "message/rfc822".to_string(),
            body: Box::new(MimeNode::blank_leaf()),
        }
    }

    fn add_header(&mut self, obj: &mut MimeNode<S>, name: &str, value: &str, offset: i64) {
        obj.headers_mut().push(RawHeader { name: name.to_string(), value: value.to_string(), offset });
    }

    fn set_raw_headers(&mut self, obj: &mut MimeNode<S>, raw: Bytes) {
        *obj.raw_headers_mut() = raw;
    }

    fn set_leaf_content(&mut self, obj: &mut MimeNode<S>, content: ContentSpan<S>, encoding: Option<String>) {
        if let MimeNode::Leaf { content: c, encoding: e, .. } = obj {
            *c = match content {
                ContentSpan::Buffered(b) => LeafContent::Buffered(b),
                ContentSpan::Persistent(s) => LeafContent::Persistent(s),
            };
            *e = encoding;
        } else {
            log::debug!("set_leaf_content called on a non-leaf node");
        }
    }

    fn set_nested_message(&mut self, obj: &mut MimeNode<S>, message: MimeNode<S>) {
        let (headers, raw_headers, content_type) = obj.take_meta();
        *obj = MimeNode::Message { headers, raw_headers, content_type, body: Box::new(message) };
    }

    fn set_message_body(&mut self, obj: &mut MimeNode<S>, body: MimeNode<S>) {
        if let MimeNode::Message { body: b, .. } = obj {
            *b = Box::new(body);
        } else {
            log::debug!("set_message_body called on a non-message node");
        }
    }

    fn finish_multipart(
        &mut self,
        obj: &mut MimeNode<S>,
        preface: Bytes,
        children: Vec<MimeNode<S>>,
        postface: Bytes,
    ) {
        let (headers, raw_headers, content_type) = obj.take_meta();
        *obj = MimeNode::Multipart { headers, raw_headers, content_type, preface, children, postface };
    }
}
