//! Path template matching.
//!
//! # Responsibilities
//! - Split template and request path into `/`-separated segments
//! - Compare segment-by-segment (literal = byte equality)
//! - Capture the value of the wildcard segment
//!
//! # Design Decisions
//! - Segment counts must be equal; no prefix or tail matching
//! - No normalization of empty segments, trailing slashes or percent-encoding
//! - No regex to guarantee O(n) matching

use std::fmt;

/// Marker for the single variable segment of a template.
pub const WILDCARD: &str = "{id}";

const SEPARATOR: char = '/';

/// Outcome of matching a request path against a template.
///
/// `variable` is only meaningful when `matched` is true. An empty string is a
/// valid captured value (e.g. `/sse/` against `/sse/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    pub variable: String,
}

impl MatchResult {
    fn no_match() -> Self {
        Self::default()
    }

    /// The captured variable, if the path matched.
    pub fn variable(&self) -> Option<&str> {
        self.matched.then_some(self.variable.as_str())
    }
}

/// Match a raw template string against a request path.
///
/// When a template carries several wildcard segments the last one walked
/// overwrites the captured value. Validated templates ([`PathTemplate`])
/// never contain more than one.
pub fn match_path(template: &str, request_path: &str) -> MatchResult {
    let pattern: Vec<&str> = template.split(SEPARATOR).collect();
    let parts: Vec<&str> = request_path.split(SEPARATOR).collect();

    if pattern.len() != parts.len() {
        return MatchResult::no_match();
    }

    let mut variable = String::new();
    for (expected, actual) in pattern.iter().zip(parts.iter()) {
        if *expected == WILDCARD {
            variable = (*actual).to_string();
        } else if expected != actual {
            return MatchResult::no_match();
        }
    }

    MatchResult {
        matched: true,
        variable,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

/// Error returned when a template cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template {template:?} contains {wildcards} wildcard segments, at most one is allowed")]
pub struct TemplateError {
    pub template: String,
    pub wildcards: usize,
}

/// A compiled endpoint template with at most one wildcard segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template, rejecting more than one wildcard segment.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let segments: Vec<Segment> = raw
            .split(SEPARATOR)
            .map(|s| {
                if s == WILDCARD {
                    Segment::Wildcard
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        let wildcards = segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard))
            .count();
        if wildcards > 1 {
            return Err(TemplateError {
                template: raw.to_string(),
                wildcards,
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path against this template.
    pub fn matches(&self, request_path: &str) -> MatchResult {
        let mut variable = String::new();
        let mut parts = request_path.split(SEPARATOR);

        for segment in &self.segments {
            let Some(actual) = parts.next() else {
                return MatchResult::no_match();
            };
            match segment {
                Segment::Wildcard => variable = actual.to_string(),
                Segment::Literal(expected) if expected == actual => {}
                Segment::Literal(_) => return MatchResult::no_match(),
            }
        }

        // Request path has more segments than the template.
        if parts.next().is_some() {
            return MatchResult::no_match();
        }

        MatchResult {
            matched: true,
            variable,
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
