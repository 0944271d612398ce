//! Mount prefix matching.
//!
//! # Responsibilities
//! - Normalize prefixes ("admin/" → "/admin", "" → "/")
//! - Match request paths segment-wise ("/a" matches "/a/x", not "/ab")
//! - Detect prefixes that shadow each other
//!
//! # Design Decisions
//! - Matching is case-sensitive
//! - The root prefix "/" matches every path
//! - No regex, segment comparison only

use std::fmt;

use crate::routing::pattern::{PathPattern, PatternError};

/// A normalized path prefix a sub-application is mounted at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountPrefix {
    prefix: String,
}

impl MountPrefix {
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim().trim_matches('/');
        let prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}")
        };
        Self { prefix }
    }

    /// Prefixes are plain segments: no parameters, splats or reserved
    /// characters, which the router cannot nest under.
    pub fn validate(&self) -> Result<(), PatternError> {
        let pattern = PathPattern::parse(&self.prefix)?;
        if pattern.is_static() {
            Ok(())
        } else {
            Err(PatternError {
                pattern: self.prefix.clone(),
                reason: "mount prefixes cannot capture parameters",
            })
        }
    }

    pub fn root() -> Self {
        Self::new("/")
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    pub fn is_root(&self) -> bool {
        self.prefix == "/"
    }

    /// Whether `path` lies under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        if self.is_root() {
            return true;
        }
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Whether one of the two prefixes contains the other.
    pub fn overlaps(&self, other: &MountPrefix) -> bool {
        self.matches(&other.prefix) || other.matches(&self.prefix)
    }

    /// Join a route path onto this prefix.
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match (self.is_root(), path.is_empty()) {
            (true, _) => format!("/{path}"),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{}", self.prefix, path),
        }
    }
}

impl Default for MountPrefix {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for MountPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

impl From<&str> for MountPrefix {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MountPrefix {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_captures() {
        assert!(MountPrefix::new("/admin/books").validate().is_ok());
        assert!(MountPrefix::root().validate().is_ok());
        assert!(MountPrefix::new("/*rest").validate().is_err());
        assert!(MountPrefix::new("/:tenant").validate().is_err());
        assert!(MountPrefix::new("/{id}").validate().is_err());
        assert!(MountPrefix::new("/a*b").validate().is_err());
    }

    #[test]
    fn test_normalization() {
        assert_eq!(MountPrefix::new("admin/").as_str(), "/admin");
        assert_eq!(MountPrefix::new("/api/v1/").as_str(), "/api/v1");
        assert_eq!(MountPrefix::new("").as_str(), "/");
        assert!(MountPrefix::new("//").is_root());
    }

    #[test]
    fn test_segment_matching() {
        let prefix = MountPrefix::new("/a");
        assert!(prefix.matches("/a"));
        assert!(prefix.matches("/a/x"));
        assert!(!prefix.matches("/ab"));
        assert!(!prefix.matches("/b/a"));
        assert!(MountPrefix::root().matches("/anything"));
    }

    #[test]
    fn test_overlaps() {
        let api = MountPrefix::new("/api");
        assert!(api.overlaps(&MountPrefix::new("/api/v1")));
        assert!(api.overlaps(&MountPrefix::root()));
        assert!(!api.overlaps(&MountPrefix::new("/apis")));
    }

    #[test]
    fn test_join() {
        assert_eq!(MountPrefix::new("/admin").join("/books/:id"), "/admin/books/:id");
        assert_eq!(MountPrefix::new("/admin").join("/"), "/admin");
        assert_eq!(MountPrefix::root().join("books"), "/books");
        assert_eq!(MountPrefix::root().join("/"), "/");
    }
}
