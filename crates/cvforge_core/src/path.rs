//! Path parsing for both mutation dialects.
//!
//! # Responsibility
//! - Turn slash pointers (patches) and dot paths (operations) into typed
//!   token sequences before any document is touched.
//! - Reject prototype-pollution-shaped segments up front.
//!
//! # Invariants
//! - A segment made only of ASCII digits is always an [`TokenKind::Index`],
//!   even when some item id looks numeric. Identity lookup of such ids needs
//!   the explicit `id/<value>` form.
//! - `-` is an append marker only in slash pointers.

use crate::error::{EngineError, EngineResult};
use std::fmt::{Display, Formatter};

/// Segments refused anywhere in a path.
pub const FORBIDDEN_SEGMENTS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// How a token addresses its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Object key; on arrays, an identity lookup by item `id`.
    Field,
    /// Positional array index.
    Index,
    /// Explicit identity lookup from the `id/<value>` form.
    Id,
    /// End-of-array marker `-`.
    Append,
}

/// One resolved path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathToken {
    pub key: String,
    pub kind: TokenKind,
}

impl PathToken {
    pub fn field(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: TokenKind::Field,
        }
    }

    pub fn index(index: usize) -> Self {
        Self {
            key: index.to_string(),
            kind: TokenKind::Index,
        }
    }

    pub fn id(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: TokenKind::Id,
        }
    }

    pub fn append() -> Self {
        Self {
            key: "-".to_string(),
            kind: TokenKind::Append,
        }
    }

    /// Numeric value of an index token.
    pub fn as_index(&self) -> Option<usize> {
        match self.kind {
            TokenKind::Index => self.key.parse().ok(),
            _ => None,
        }
    }
}

impl Display for PathToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Id => write!(f, "id/{}", self.key),
            _ => f.write_str(&self.key),
        }
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit())
}

fn unescape(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace("~1", "/").replace("~0", "~")
}

fn guard(path: &str, segment: &str) -> EngineResult<()> {
    if FORBIDDEN_SEGMENTS.contains(&segment) {
        return Err(EngineError::InvalidPatchPath {
            path: path.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(())
}

/// Parses an RFC 6901 pointer with id-aware array addressing.
///
/// The empty string is the root. `id` followed by another segment collapses
/// into one [`TokenKind::Id`] token.
pub fn parse_pointer(path: &str) -> EngineResult<Vec<PathToken>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(EngineError::InvalidPatchPath {
            path: path.to_string(),
            segment: path.to_string(),
        });
    };

    let segments: Vec<String> = rest.split('/').map(unescape).collect();
    for segment in &segments {
        guard(path, segment)?;
    }

    let mut tokens = Vec::with_capacity(segments.len());
    let mut iter = segments.into_iter().peekable();
    while let Some(segment) = iter.next() {
        let token = if segment == "id" && iter.peek().is_some() {
            match iter.next() {
                Some(id) => PathToken::id(id),
                None => PathToken::field(segment),
            }
        } else if segment == "-" {
            PathToken::append()
        } else if is_index(&segment) {
            PathToken {
                key: segment,
                kind: TokenKind::Index,
            }
        } else {
            PathToken::field(segment)
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Parses a dot-delimited operation path such as `sections.skills.items.0.name`.
pub fn parse_dot_path(path: &str) -> EngineResult<Vec<PathToken>> {
    if path.is_empty() {
        return Err(EngineError::InvalidPatchPath {
            path: String::new(),
            segment: String::new(),
        });
    }
    path.split('.')
        .map(|segment| {
            guard(path, segment)?;
            if segment.is_empty() {
                return Err(EngineError::InvalidPatchPath {
                    path: path.to_string(),
                    segment: String::new(),
                });
            }
            Ok(if is_index(segment) {
                PathToken {
                    key: segment.to_string(),
                    kind: TokenKind::Index,
                }
            } else {
                PathToken::field(segment)
            })
        })
        .collect()
}
