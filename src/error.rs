// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error types returned by the parser and its supporting pieces.
//!
//! Malformed message content is, by design, almost never an `Err` here: a
//! missing colon in a header or an unmatched MIME boundary is tolerated and
//! surfaces as a best-effort parse instead. `Error` exists for the cases
//! that really are exceptional: the underlying stream failing, or the
//! caller configuring the parser with something nonsensical.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// The underlying stream returned an I/O error while being read.
    Io(io::Error),
    /// A `Content-Type` string could not be parsed at all.
    InvalidContentType(mime::FromStrError),
    /// `Parser::set_header_regex` was given a pattern that doesn't compile.
    InvalidHeaderRegex(regex::Error),
    /// `signed::split` was called on a multipart with fewer than two
    /// children.
    MissingSignedSubparts,
    /// `signed::boundary_of` was given a `multipart/signed` node with no
    /// `boundary` parameter in its `Content-Type`.
    NoContentTypeBoundary,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "stream error: {}", e),
            Error::InvalidContentType(e) => write!(f, "invalid content-type: {}", e),
            Error::InvalidHeaderRegex(e) => write!(f, "invalid header regex: {}", e),
            Error::MissingSignedSubparts => write!(f, "multipart/signed must have at least two subparts"),
            Error::NoContentTypeBoundary => write!(f, "content-type has no boundary parameter"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::InvalidContentType(e) => Some(e),
            Error::InvalidHeaderRegex(e) => Some(e),
            Error::MissingSignedSubparts | Error::NoContentTypeBoundary => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<mime::FromStrError> for Error {
    fn from(e: mime::FromStrError) -> Error {
        Error::InvalidContentType(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Error {
        Error::InvalidHeaderRegex(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
