//! Filename pattern engine.
//!
//! File patterns come in two flavors:
//! - **Extension globs** start with `.` and contain no `/` (`.c`, `.{cpp,h}`,
//!   `.[ch]pp`). They match path suffixes.
//! - **Path globs** are everything else (`src`, `lib/*.c`, `**/test_*.py`).
//!   They match repository-relative paths segment by segment.
//!
//! ## Usage
//!
//! ```
//! use vcsgrep_core::glob::{compile, RawPattern};
//!
//! let pattern = compile(&RawPattern::include(".{c,h}")).unwrap();
//! assert!(pattern.matches("lib/list.h"));
//! assert!(!pattern.matches("lib/list.hpp"));
//! ```

pub mod expand;
mod extension;
mod path;

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use serde::Serialize;
use thiserror::Error;

pub use extension::{compile_extension, SuffixGlob};
pub use path::{compile_path, SegmentMatcher};

/// Why a pattern failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    /// The pattern string is empty.
    Empty,
    /// A `{` group is never closed.
    UnclosedBrace,
    /// A `}` appears outside any group.
    UnexpectedBrace,
    /// A `[` group is never closed. A `]` right after the opener is a
    /// member of the set, so `[]` alone is unclosed too.
    UnclosedBracket,
    /// A `[!...]` or `[^...]` group, which cannot be expanded into variants.
    NegatedBracket,
    /// Expansion would produce more than [`expand::MAX_VARIANTS`] variants.
    TooManyVariants,
}

impl fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyntaxReason::Empty => "empty pattern",
            SyntaxReason::UnclosedBrace => "unclosed \"{\"",
            SyntaxReason::UnexpectedBrace => "unexpected \"}\"",
            SyntaxReason::UnclosedBracket => "unclosed \"[\"",
            SyntaxReason::NegatedBracket => "negated \"[...]\" groups are not supported",
            SyntaxReason::TooManyVariants => "too many alternatives",
        };
        f.write_str(text)
    }
}

/// Error type for pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Malformed glob syntax. Never partially applied.
    #[error("invalid glob pattern ({reason}): {pattern}")]
    Syntax {
        pattern: String,
        reason: SyntaxReason,
    },

    /// A wildcard variant that `globset` refused.
    #[error("invalid glob pattern ({message}): {pattern}")]
    Wildcard { pattern: String, message: String },
}

impl PatternError {
    pub(crate) fn syntax(pattern: &str, reason: SyntaxReason) -> Self {
        PatternError::Syntax {
            pattern: pattern.to_string(),
            reason,
        }
    }

    pub(crate) fn wildcard(pattern: &str, err: globset::Error) -> Self {
        PatternError::Wildcard {
            pattern: pattern.to_string(),
            message: err.kind().to_string(),
        }
    }
}

/// Returns true if `pattern` contains `*` or `?`.
pub(crate) fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// A group-free wildcard pattern compiled with `globset`.
///
/// Groups are expanded before this point, so any `{`, `}` or `[` left in the
/// text is literal. `\` is an ordinary character. Equality compares the
/// pattern text.
#[derive(Debug, Clone)]
pub(crate) struct Wildcard {
    text: String,
    matcher: GlobMatcher,
}

impl Wildcard {
    /// Compile `text`; `*` and `?` match `/` unless `literal_separator` is set.
    pub(crate) fn new(text: &str, literal_separator: bool) -> Result<Self, globset::Error> {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '{' | '}' | '[' => {
                    escaped.push('[');
                    escaped.push(c);
                    escaped.push(']');
                }
                _ => escaped.push(c),
            }
        }
        let glob = GlobBuilder::new(&escaped)
            .literal_separator(literal_separator)
            .backslash_escape(false)
            .build()?;
        Ok(Wildcard {
            text: text.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

impl PartialEq for Wildcard {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Wildcard {}

/// Which compiler a pattern is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Leading `.` and no `/`: matched against path suffixes.
    ExtensionGlob,
    /// Anything else: matched against whole paths.
    PathGlob,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::ExtensionGlob => write!(f, "extension glob"),
            PatternKind::PathGlob => write!(f, "path glob"),
        }
    }
}

/// Classify one raw pattern string.
pub fn classify(pattern: &str) -> PatternKind {
    if pattern.starts_with('.') && !pattern.contains('/') {
        PatternKind::ExtensionGlob
    } else {
        PatternKind::PathGlob
    }
}

/// A filename pattern as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawPattern {
    /// The pattern text.
    pub text: String,
    /// Set when the pattern was the argument of the exclude marker.
    pub exclude: bool,
}

impl RawPattern {
    /// An inclusion pattern.
    pub fn include(text: impl Into<String>) -> Self {
        RawPattern {
            text: text.into(),
            exclude: false,
        }
    }

    /// An exclusion pattern.
    pub fn exclude(text: impl Into<String>) -> Self {
        RawPattern {
            text: text.into(),
            exclude: true,
        }
    }

    pub fn kind(&self) -> PatternKind {
        classify(&self.text)
    }
}

/// A compiled matching predicate over repository-relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledPredicate {
    /// The path ends with one of these literal suffixes.
    SuffixSet(Vec<String>),
    /// Some suffix of the path matches a wildcard pattern.
    SuffixGlob(SuffixGlob),
    /// The path matches a sequence of segment tokens.
    Segments(SegmentMatcher),
}

impl CompiledPredicate {
    /// Test a path (forward slashes, relative to the repository root).
    pub fn matches(&self, path: &str) -> bool {
        match self {
            CompiledPredicate::SuffixSet(suffixes) => {
                suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
            }
            CompiledPredicate::SuffixGlob(glob) => glob.matches(path),
            CompiledPredicate::Segments(matcher) => matcher.matches(path),
        }
    }
}

impl fmt::Display for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledPredicate::SuffixSet(suffixes) => {
                write!(f, "suffix in {{{}}}", suffixes.join(", "))
            }
            CompiledPredicate::SuffixGlob(glob) => write!(f, "{}", glob),
            CompiledPredicate::Segments(matcher) => write!(f, "{}", matcher),
        }
    }
}

/// A raw pattern together with the predicates it compiled into.
///
/// A path matches the pattern when it matches any of the predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    pub raw: RawPattern,
    pub kind: PatternKind,
    pub predicates: Vec<CompiledPredicate>,
}

impl CompiledPattern {
    pub fn matches(&self, path: &str) -> bool {
        self.predicates.iter().any(|p| p.matches(path))
    }
}

/// Classify and compile one raw pattern.
pub fn compile(raw: &RawPattern) -> Result<CompiledPattern, PatternError> {
    if raw.text.is_empty() {
        return Err(PatternError::syntax(&raw.text, SyntaxReason::Empty));
    }
    let kind = raw.kind();
    let predicates = match kind {
        PatternKind::ExtensionGlob => compile_extension(&raw.text)?,
        PatternKind::PathGlob => compile_path(&raw.text)?,
    };
    Ok(CompiledPattern {
        raw: raw.clone(),
        kind,
        predicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_classify_extension_globs() {
        assert_eq!(classify(".c"), PatternKind::ExtensionGlob);
        assert_eq!(classify(".{cpp,h}"), PatternKind::ExtensionGlob);
        assert_eq!(classify(".[ch]pp"), PatternKind::ExtensionGlob);
        assert_eq!(classify(".bashrc"), PatternKind::ExtensionGlob);
    }

    #[test]
    fn test_classify_path_globs() {
        assert_eq!(classify("lib"), PatternKind::PathGlob);
        assert_eq!(classify("*.c"), PatternKind::PathGlob);
        assert_eq!(classify("./.bashrc"), PatternKind::PathGlob);
        assert_eq!(classify(".config/nvim"), PatternKind::PathGlob);
        assert_eq!(classify("**.c"), PatternKind::PathGlob);
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    #[test]
    fn test_compile_empty_pattern_is_syntax_error() {
        let err = compile(&RawPattern::include("")).unwrap_err();
        assert_eq!(
            err,
            PatternError::Syntax {
                pattern: String::new(),
                reason: SyntaxReason::Empty,
            }
        );
    }

    #[test]
    fn test_compile_keeps_raw_and_kind() {
        let compiled = compile(&RawPattern::exclude("External")).unwrap();
        assert!(compiled.raw.exclude);
        assert_eq!(compiled.kind, PatternKind::PathGlob);
        assert!(compiled.matches("External/zlib/inflate.c"));
    }

    #[test]
    fn test_syntax_error_names_pattern() {
        let err = compile(&RawPattern::include(".{c,h")).unwrap_err();
        assert_eq!(err.to_string(), "invalid glob pattern (unclosed \"{\"): .{c,h");
    }

    #[test]
    fn test_predicate_display() {
        let compiled = compile(&RawPattern::include(".{cpp,h,asm}")).unwrap();
        assert_eq!(compiled.predicates.len(), 1);
        assert_eq!(compiled.predicates[0].to_string(), "suffix in {.cpp, .h, .asm}");
    }
}
