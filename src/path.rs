//! Path segments for the fabricated filesystem.
//!
//! Unlike the teacher's `DavPath`, which wraps a raw URL and offers
//! OS-path conversions for a real filesystem, this type is the pure
//! ordered-segment form spec.md's data model describes: "/" is the
//! empty sequence, and no code path should ever turn that into a
//! segment literally named "root".

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::error::DavError;

/// Characters that must be percent-encoded in a path segment when
/// building an `href`. `http::Uri` already forbids raw spaces etc, but
/// we build hrefs by hand via `xmltree`, so we encode ourselves.
const SEGMENT_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// An ordered sequence of non-empty path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Path(Vec<String>);

impl Path {
    /// The root path ("/").
    pub fn root() -> Path {
        Path(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn into_segments(self) -> Vec<String> {
        self.0
    }

    pub fn from_segments(segments: Vec<String>) -> Path {
        Path(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parent(&self) -> Path {
        if self.0.is_empty() {
            Path::root()
        } else {
            Path(self.0[..self.0.len() - 1].to_vec())
        }
    }

    pub fn child(&self, name: impl Into<String>) -> Path {
        let mut segs = self.0.clone();
        segs.push(name.into());
        Path(segs)
    }

    /// Parse a single path segment, rejecting the separator and the
    /// two dot-segments per spec.md §3.
    fn validate_segment(seg: &str) -> Result<(), DavError> {
        if seg.is_empty() || seg == "." || seg == ".." || seg.contains('/') {
            return Err(DavError::BadRequest(format!("invalid path segment {seg:?}")));
        }
        Ok(())
    }

    /// Parse a display path such as `/a/b/c` or `/a/b/` into segments.
    /// `path_to_segments("/") == []` always — the pure root-path rule.
    pub fn parse(display: &str) -> Result<Path, DavError> {
        let trimmed = display.trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Path::root());
        }
        let mut segs = Vec::new();
        for raw in trimmed.trim_end_matches('/').split('/') {
            let decoded = percent_encoding::percent_decode_str(raw)
                .decode_utf8()
                .map_err(|_| DavError::BadRequest("invalid percent-encoding in path".into()))?
                .into_owned();
            Path::validate_segment(&decoded)?;
            segs.push(decoded);
        }
        Ok(Path(segs))
    }

    /// `segments_to_display_path([]) == "/"`.
    pub fn display_path(&self) -> String {
        if self.0.is_empty() {
            "/".to_string()
        } else {
            let mut s = String::new();
            for seg in &self.0 {
                s.push('/');
                s.push_str(seg);
            }
            s
        }
    }

    /// URL-encoded form suitable for an `<D:href>`, with a trailing
    /// slash when `is_collection` is true.
    pub fn href(&self, is_collection: bool) -> String {
        let mut s = String::new();
        for seg in &self.0 {
            s.push('/');
            s.push_str(&utf8_percent_encode(seg, SEGMENT_ENCODE).to_string());
        }
        if s.is_empty() || is_collection {
            s.push('/');
        }
        s
    }

    /// The inflight-key display form: identical to `display_path`, kept
    /// as a separate method so call sites read intention-revealingly.
    pub fn inflight_display(&self) -> String {
        self.display_path()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_round_trips() {
        assert_eq!(Path::parse("/").unwrap(), Path::root());
        assert_eq!(Path::root().display_path(), "/");
        assert!(Path::root().segments().is_empty());
    }

    #[test]
    fn never_produces_a_root_segment() {
        let p = Path::parse("/").unwrap();
        assert!(!p.segments().iter().any(|s| s == "root"));
    }

    #[test]
    fn parses_nested_paths() {
        let p = Path::parse("/a/b/c").unwrap();
        assert_eq!(p.segments(), &["a", "b", "c"]);
        assert_eq!(p.display_path(), "/a/b/c");
    }

    #[test]
    fn trailing_slash_is_ignored() {
        assert_eq!(Path::parse("/a/b/"), Path::parse("/a/b"));
    }

    #[test]
    fn rejects_dot_segments() {
        assert!(Path::parse("/a/../b").is_err());
        assert!(Path::parse("/./a").is_err());
    }

    #[test]
    fn child_and_parent() {
        let p = Path::root().child("a").child("b");
        assert_eq!(p.display_path(), "/a/b");
        assert_eq!(p.parent().display_path(), "/a");
        assert_eq!(p.parent().parent(), Path::root());
    }

    #[test]
    fn href_encodes_and_adds_slash_for_collections() {
        let p = Path::root().child("a b");
        assert_eq!(p.href(false), "/a%20b");
        assert_eq!(p.href(true), "/a%20b/");
        assert_eq!(Path::root().href(true), "/");
    }
}
