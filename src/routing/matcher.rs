//! Path template matching.
//!
//! # Responsibilities
//! - Parse templates such as `/editor/generated/{lang}/compressed.js`
//! - Match a request path segment by segment
//! - Capture named parameters and catch-all remainders
//!
//! # Design Decisions
//! - `{name}` captures exactly one non-empty segment
//! - `{**name}` (or `{*name}`) captures the rest of the path verbatim and
//!   must be the last segment
//! - Literal segments are matched ASCII case-insensitively
//! - No regex, matching is a single left-to-right pass

use crate::routing::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// A parsed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template string.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| RouteError::MissingLeadingSlash(template.to_string()))?;

        let raw_segments: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw_segments.len());

        for (index, raw) in raw_segments.iter().enumerate() {
            let segment = parse_segment(raw).ok_or_else(|| RouteError::InvalidSegment {
                template: template.to_string(),
                segment: raw.to_string(),
            })?;
            if matches!(segment, Segment::CatchAll(_)) && index + 1 != raw_segments.len() {
                return Err(RouteError::CatchAllNotLast(template.to_string()));
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path` against the template, returning captured values.
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let mut remaining = Some(path.strip_prefix('/')?);
        let mut values = RouteValues::default();

        for segment in &self.segments {
            match segment {
                Segment::CatchAll(name) => {
                    values.insert(name, remaining.unwrap_or(""));
                    return Some(values);
                }
                Segment::Literal(literal) => {
                    let (head, tail) = next_segment(remaining?);
                    if !head.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                    remaining = tail;
                }
                Segment::Param(name) => {
                    let (head, tail) = next_segment(remaining?);
                    if head.is_empty() {
                        return None;
                    }
                    values.insert(name, head);
                    remaining = tail;
                }
            }
        }

        remaining.is_none().then_some(values)
    }
}

fn next_segment(path: &str) -> (&str, Option<&str>) {
    match path.split_once('/') {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    }
}

fn parse_segment(raw: &str) -> Option<Segment> {
    let Some(inner) = raw.strip_prefix('{') else {
        if raw.contains(['{', '}']) {
            return None;
        }
        return Some(Segment::Literal(raw.to_string()));
    };
    let inner = inner.strip_suffix('}')?;

    let (name, catch_all) = match inner.strip_prefix("**").or_else(|| inner.strip_prefix('*')) {
        Some(name) => (name, true),
        None => (inner, false),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some(if catch_all {
        Segment::CatchAll(name.to_string())
    } else {
        Segment::Param(name.to_string())
    })
}

/// Values captured by a template match, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: Vec<(String, String)>,
}

impl RouteValues {
    fn insert(&mut self, name: &str, value: &str) {
        self.values.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
