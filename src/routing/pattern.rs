//! Route path patterns.
//!
//! Patterns are written with `:name` parameters and an optional trailing
//! `*name` splat, e.g. `/books/:id` or `/files/*path`. They are compiled
//! into axum's `{name}` / `{*name}` syntax when a slice router is built.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Param(String),
    Splat(String),
}

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

/// Why a pattern was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid route path {pattern:?}: {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

impl PathPattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let error = |reason| PatternError {
            pattern: source.to_string(),
            reason,
        };

        if !source.starts_with('/') {
            return Err(error("must start with '/'"));
        }

        let raw: Vec<&str> = source
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut segments = Vec::with_capacity(raw.len());
        for (i, part) in raw.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                Segment::Param(valid_name(name).ok_or_else(|| error("bad parameter name"))?)
            } else if let Some(name) = part.strip_prefix('*') {
                if i + 1 != raw.len() {
                    return Err(error("splat must be the last segment"));
                }
                Segment::Splat(valid_name(name).ok_or_else(|| error("bad splat name"))?)
            } else if part.contains(['{', '}', ':', '*']) {
                return Err(error("reserved character in static segment"));
            } else {
                Segment::Static(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in order of appearance.
    pub fn params(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(n) | Segment::Splat(n) => Some(n.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// The pattern in axum's route syntax.
    pub fn to_axum(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(v) => format!("/{v}"),
                Segment::Param(n) => format!("/{{{n}}}"),
                Segment::Splat(n) => format!("/{{*{n}}}"),
            })
            .collect()
    }

    /// The pattern with parameter names erased. Two patterns with the same
    /// shape cannot live in one router.
    pub fn shape(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(v) => format!("/{v}"),
                Segment::Param(_) => "/:".to_string(),
                Segment::Splat(_) => "/*".to_string(),
            })
            .collect()
    }

    /// Whether every segment is static.
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Static(_)))
    }

    /// Match `path` and capture parameter values (raw, not percent-decoded).
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut parts = path.trim_start_matches('/').split('/').filter(|s| !s.is_empty());
        let mut params = HashMap::new();

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if parts.next()? != expected {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), parts.next()?.to_string());
                }
                Segment::Splat(name) => {
                    let rest: Vec<&str> = parts.by_ref().collect();
                    params.insert(name.clone(), rest.join("/"));
                }
            }
        }

        parts.next().is_none().then_some(params)
    }
}

fn valid_name(name: &str) -> Option<String> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    ok.then(|| name.to_string())
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
