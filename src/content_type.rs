// Copyright 2016 mime-multipart Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A thin wrapper around [`mime::Mime`] for the handful of queries the
//! parser and its consumers need: type/subtype comparison and parameter
//! lookup (`boundary`, `charset`, and so on).

use std::str::FromStr;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ContentType {
    mime: mime::Mime,
}

impl ContentType {
    pub fn parse(raw: &str) -> Result<ContentType> {
        let mime = mime::Mime::from_str(raw.trim())?;
        Ok(ContentType { mime })
    }

    /// The type assumed for a part whose `Content-Type` header is missing
    /// or unparseable.
    pub fn text_plain() -> ContentType {
        ContentType { mime: mime::TEXT_PLAIN }
    }

    pub fn type_(&self) -> &str {
        self.mime.type_().as_str()
    }

    pub fn subtype(&self) -> &str {
        self.mime.subtype().as_str()
    }

    /// Compares against `type_/subtype`, case-insensitively; `subtype ==
    /// "*"` matches any subtype.
    pub fn is_type(&self, type_: &str, subtype: &str) -> bool {
        if !self.type_().eq_ignore_ascii_case(type_) {
            return false;
        }
        subtype == "*" || self.subtype().eq_ignore_ascii_case(subtype)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&str> {
        self.mime.get_param(name).map(|v| v.as_str())
    }

    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_(), self.subtype())
    }
}

/// Parses the `Content-Type` header value, falling back to `text/plain`
/// when it's missing or malformed rather than failing the whole parse.
pub fn parse_or_default(raw: Option<&str>) -> ContentType {
    raw.and_then(|s| ContentType::parse(s).ok()).unwrap_or_else(ContentType::text_plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_text_plain() {
        let ct = parse_or_default(None);
        assert!(ct.is_type("text", "plain"));
        let ct = parse_or_default(Some("not a mime type;;;"));
        assert!(ct.is_type("text", "plain"));
    }

    #[test]
    fn wildcard_subtype_matches_multipart() {
        let ct = ContentType::parse("multipart/mixed; boundary=foo").unwrap();
        assert!(ct.is_type("multipart", "*"));
        assert_eq!(ct.get_parameter("boundary"), Some("foo"));
    }
}
