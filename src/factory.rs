// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The collaborator the parser delegates actual object construction to.
//!
//! Building a recursive MIME tree is a separate concern from scanning
//! bytes for boundaries: callers that want a different object model (a
//! lazily-loaded message store, a GC-tracked DOM, whatever) implement
//! [`ObjectFactory`] instead of forking the parser. [`crate::tree`]
//! provides a ready-to-use implementation for callers who just want a
//! plain tree.

use bytes::Bytes;

use crate::content_type::ContentType;

/// A leaf part's content, handed to the factory once its bounds are known.
pub enum ContentSpan<S> {
    /// Content backed by a substream of the original input, valid only
    /// when the parser was constructed over a seekable stream with
    /// persistent-mode storage enabled.
    Persistent(S),
    /// Content copied into memory, used for non-seekable streams or when
    /// persistent mode is disabled.
    Buffered(Bytes),
}

/// Builds the concrete object tree a [`crate::parser::Parser`] discovers.
///
/// `Object` is the caller's node type. The parser never inspects it beyond
/// passing it back into later factory calls, so the tree's shape is
/// entirely up to the implementation.
pub trait ObjectFactory<S> {
    type Object;

    /// Whether `content_type` should be parsed as a nested RFC 5322
    /// message (`message/rfc822` and similar) rather than a leaf or
    /// multipart. The parser has no opinion of its own on which content
    /// types are "message-like" — that's a policy decision left entirely
    /// to the factory.
    fn is_message_part(&self, content_type: &ContentType) -> bool;

    /// Starts a new part (leaf, multipart, or message-part) with the given
    /// content type. Headers are attached afterward via `add_header`.
    fn new_object(&mut self, content_type: &ContentType) -> Self::Object;

    /// Starts a new top-level message envelope.
    fn new_message(&mut self) -> Self::Object;

    fn add_header(&mut self, obj: &mut Self::Object, name: &str, value: &str, offset: i64);

    fn set_raw_headers(&mut self, obj: &mut Self::Object, raw: Bytes);

    /// Finishes a leaf part by attaching its content and declared
    /// transfer encoding (if any).
    fn set_leaf_content(&mut self, obj: &mut Self::Object, content: ContentSpan<S>, encoding: Option<String>);

    /// Finishes a message-part leaf by attaching the nested message parsed
    /// from its body.
    fn set_nested_message(&mut self, obj: &mut Self::Object, message: Self::Object);

    /// Attaches a top-level message's body (its single mime part).
    fn set_message_body(&mut self, obj: &mut Self::Object, body: Self::Object);

    /// Finishes a multipart by attaching its preamble, subparts, and
    /// epilogue.
    fn finish_multipart(
        &mut self,
        obj: &mut Self::Object,
        preface: Bytes,
        children: Vec<Self::Object>,
        postface: Bytes,
    );
}
