//! Path glob compilation.
//!
//! A path glob is split on `/` into segments:
//!
//! - a literal segment matches that exact path component;
//! - a segment with `*` or `?` matches one component (`*` never crosses `/`);
//!   a `**` run *inside* a segment (`**.c`) does cross `/`;
//! - a bare `**` segment matches zero or more whole components.
//!
//! Globs are anchored at the repository root and select directories too: a
//! glob matches a path when it matches the whole path or any leading run of
//! its components. The one exception is a single bare name (`lib`), which
//! matches that component at any depth. A leading `./` forces root anchoring.

use std::fmt;

use super::expand::expand;
use super::{has_wildcard, CompiledPredicate, PatternError, Wildcard};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Wildcards within a single component.
    Component(Wildcard),
    /// Contains a `**` run: spans one or more components, and its wildcards
    /// may match `/`.
    Spanning(Wildcard),
    /// Bare `**`.
    AnyDepth,
}

impl Segment {
    fn compile(text: &str) -> Result<Self, globset::Error> {
        let segment = if text.len() >= 2 && text.chars().all(|c| c == '*') {
            Segment::AnyDepth
        } else if text.contains("**") {
            Segment::Spanning(Wildcard::new(text, false)?)
        } else if has_wildcard(text) {
            Segment::Component(Wildcard::new(text, true)?)
        } else {
            Segment::Literal(text.to_string())
        };
        Ok(segment)
    }
}

/// Compiled form of one path glob variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMatcher {
    /// Normalized pattern text, for diagnostics.
    pattern: String,
    segments: Vec<Segment>,
    /// False for bare names, which may match at any depth.
    anchored: bool,
}

impl SegmentMatcher {
    /// Compile a single normalized variant (no groups).
    fn new(pattern: String, anchored: bool) -> Result<Self, globset::Error> {
        let segments = if pattern.is_empty() {
            Vec::new()
        } else {
            pattern
                .split('/')
                .map(Segment::compile)
                .collect::<Result<_, _>>()?
        };
        Ok(SegmentMatcher {
            pattern,
            segments,
            anchored,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        if self.anchored {
            match_segments(&self.segments, &components)
        } else {
            (0..components.len()).any(|start| match_segments(&self.segments, &components[start..]))
        }
    }
}

impl fmt::Display for SegmentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pattern.is_empty() {
            write!(f, "any path")
        } else if self.anchored {
            write!(f, "path under root matches {}", self.pattern)
        } else {
            write!(f, "path component {} at any depth", self.pattern)
        }
    }
}

/// Match leading components against segments. Components left over after all
/// segments matched are files beneath a matched directory.
fn match_segments(segments: &[Segment], components: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return true;
    };
    match first {
        Segment::AnyDepth => {
            (0..=components.len()).any(|skip| match_segments(rest, &components[skip..]))
        }
        Segment::Literal(name) => {
            components.first() == Some(&name.as_str()) && match_segments(rest, &components[1..])
        }
        Segment::Component(wildcard) => {
            components.first().is_some_and(|c| wildcard.is_match(c))
                && match_segments(rest, &components[1..])
        }
        Segment::Spanning(wildcard) => (1..=components.len()).any(|take| {
            wildcard.is_match(&components[..take].join("/"))
                && match_segments(rest, &components[take..])
        }),
    }
}

/// Strip `./` prefixes, `.` components, empty components and trailing `/`.
///
/// Returns the normalized text and whether an explicit `./` root prefix was
/// present.
fn normalize(pattern: &str) -> (String, bool) {
    let mut rest = pattern;
    let mut explicit_root = false;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
        explicit_root = true;
    }
    let normalized = rest
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/");
    (normalized, explicit_root)
}

/// Compile a path glob into one segment matcher per expanded variant.
pub fn compile_path(pattern: &str) -> Result<Vec<CompiledPredicate>, PatternError> {
    let (normalized, explicit_root) = normalize(pattern);

    let mut predicates = Vec::new();
    for variant in expand(&normalized)? {
        let (variant, _) = normalize(&variant);
        let bare_name = !explicit_root
            && !variant.is_empty()
            && !variant.contains('/')
            && !has_wildcard(&variant);
        let matcher = SegmentMatcher::new(variant, !bare_name)
            .map_err(|e| PatternError::wildcard(pattern, e))?;
        predicates.push(CompiledPredicate::Segments(matcher));
    }
    Ok(predicates)
}
