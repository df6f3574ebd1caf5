//! API path canonicalization and validation
//!
//! Every component addresses entities through an [`ApiPath`]: a `/`-separated
//! unicode string relative to the contents root, with no leading or trailing
//! slash. The empty string is the root.

use crate::error::ContentsError;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Segment the checkpoint machinery keeps to itself. Never addressable by callers.
pub const RESERVED_SEGMENT: &str = ".ipynb_checkpoints";

/// Hide patterns applied to listings when none are configured
pub const DEFAULT_HIDE_GLOBS: &[&str] = &[
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".DS_Store",
    "*.so",
    "*.dylib",
    "*~",
];

/// A normalized virtual path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiPath(String);

impl ApiPath {
    /// The root path (`''`)
    pub fn root() -> Self {
        ApiPath(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment; empty for the root
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Containing directory; the root is its own parent
    pub fn parent(&self) -> ApiPath {
        match self.0.rfind('/') {
            Some(idx) => ApiPath(self.0[..idx].to_string()),
            None => ApiPath::root(),
        }
    }

    /// Segments from the root down
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// True if `self` is `ancestor` or lies beneath it
    pub fn starts_with(&self, ancestor: &ApiPath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        self.0 == ancestor.0
            || (self.0.starts_with(&ancestor.0) && self.0.as_bytes()[ancestor.0.len()] == b'/')
    }

    /// Re-root `self` from `old` to `new`. Returns `None` when `self` is not under `old`.
    pub fn rebase(&self, old: &ApiPath, new: &ApiPath) -> Option<ApiPath> {
        if !self.starts_with(old) {
            return None;
        }
        let rest = self.0[old.0.len()..].trim_start_matches('/');
        if rest.is_empty() {
            return Some(new.clone());
        }
        if new.is_root() {
            return Some(ApiPath(rest.to_string()));
        }
        Some(ApiPath(format!("{}/{}", new.0, rest)))
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ApiPath {
    type Error = ContentsError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        normalize(&raw)
    }
}

impl TryFrom<&str> for ApiPath {
    type Error = ContentsError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        normalize(raw)
    }
}

impl From<ApiPath> for String {
    fn from(path: ApiPath) -> Self {
        path.0
    }
}

/// Normalize a raw caller path
///
/// Strips surrounding slashes and composes Unicode to NFC. Rejects empty
/// interior segments (`a//b`), `.`/`..`, control characters and the reserved
/// checkpoint segment.
pub fn normalize(raw: &str) -> Result<ApiPath, ContentsError> {
    let composed: String = raw.nfc().collect();
    let trimmed = composed.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(ApiPath::root());
    }
    for segment in trimmed.split('/') {
        validate_segment(segment, raw)?;
    }
    Ok(ApiPath(trimmed.to_string()))
}

fn validate_segment(segment: &str, raw: &str) -> Result<(), ContentsError> {
    if segment.is_empty() {
        return Err(ContentsError::InvalidPath(format!(
            "empty segment in {:?}",
            raw
        )));
    }
    if segment == "." || segment == ".." {
        return Err(ContentsError::InvalidPath(format!(
            "relative segment {:?} in {:?}",
            segment, raw
        )));
    }
    if segment.chars().any(char::is_control) {
        return Err(ContentsError::InvalidPath(format!(
            "control character in {:?}",
            raw
        )));
    }
    if segment == RESERVED_SEGMENT {
        return Err(ContentsError::InvalidPath(format!(
            "reserved segment {:?} in {:?}",
            RESERVED_SEGMENT, raw
        )));
    }
    Ok(())
}

/// Join a directory and a single name
pub fn join(dir: &ApiPath, name: &str) -> Result<ApiPath, ContentsError> {
    let name: String = name.nfc().collect();
    if name.contains('/') {
        return Err(ContentsError::InvalidPath(format!(
            "name {:?} contains a separator",
            name
        )));
    }
    validate_segment(&name, &name)?;
    if dir.is_root() {
        Ok(ApiPath(name))
    } else {
        Ok(ApiPath(format!("{}/{}", dir.0, name)))
    }
}

/// Split a path into (directory, name). Inverse of [`join`].
pub fn split(path: &ApiPath) -> (ApiPath, String) {
    (path.parent(), path.name().to_string())
}

/// Split a file name into base and extension at the last dot
///
/// Leading dots belong to the base: `.bashrc` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(idx) => name.split_at(stem_start + idx),
        None => (name, ""),
    }
}

/// Test a name against a set of glob patterns
pub fn is_hidden(name: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

/// Listing-time hide predicate, compiled once from configuration
#[derive(Debug, Clone)]
pub struct HideFilter {
    patterns: Vec<Pattern>,
}

impl HideFilter {
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self, ContentsError> {
        let patterns = globs
            .iter()
            .map(|g| {
                Pattern::new(g.as_ref()).map_err(|e| {
                    ContentsError::ConfigError(format!(
                        "Invalid hide glob {:?}: {}",
                        g.as_ref(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Should `name` be left out of a directory listing?
    pub fn is_hidden(&self, name: &str) -> bool {
        name == RESERVED_SEGMENT || is_hidden(name, &self.patterns)
    }
}

impl Default for HideFilter {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_HIDE_GLOBS
                .iter()
                .filter_map(|g| Pattern::new(g).ok())
                .collect(),
        }
    }
}
