//! Search backend flag table.
//!
//! Each known grep flag maps to whether it consumes an argument and what the
//! classifier should note about it. Long flags not in the table pass through
//! as argument-free; short letters not in the table likewise.

use super::RegexMode;

/// Whether a flag takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagArity {
    NoArgument,
    OneArgument,
    /// Rejected outright, with the reason shown to the user.
    Unsupported(&'static str),
}

/// Side effect a flag has on classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagEffect {
    None,
    /// Selects the regex syntax.
    SelectMode(RegexMode),
    /// The search expression comes from this flag, not from a bare token.
    SuppliesExpression,
    /// Asks for the version report.
    RequestVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    pub arity: FlagArity,
    pub effect: FlagEffect,
}

impl FlagSpec {
    const fn plain() -> Self {
        FlagSpec {
            arity: FlagArity::NoArgument,
            effect: FlagEffect::None,
        }
    }

    const fn with_argument() -> Self {
        FlagSpec {
            arity: FlagArity::OneArgument,
            effect: FlagEffect::None,
        }
    }

    const fn mode(mode: RegexMode) -> Self {
        FlagSpec {
            arity: FlagArity::NoArgument,
            effect: FlagEffect::SelectMode(mode),
        }
    }

    const fn expression() -> Self {
        FlagSpec {
            arity: FlagArity::OneArgument,
            effect: FlagEffect::SuppliesExpression,
        }
    }

    const fn unsupported(reason: &'static str) -> Self {
        FlagSpec {
            arity: FlagArity::Unsupported(reason),
            effect: FlagEffect::None,
        }
    }

    pub fn takes_argument(&self) -> bool {
        self.arity == FlagArity::OneArgument
    }
}

/// Reason given for quiet-mode flags.
pub const QUIET_REASON: &str =
    "the exit status reflects the whole pipeline, so quiet mode is meaningless";

/// Reason given for recursive flags.
pub const RECURSIVE_REASON: &str =
    "files come from version control; use file patterns to select them";

/// Long flags, without the leading `--`.
pub const LONG_FLAGS: &[(&str, FlagSpec)] = &[
    // Matcher selection
    ("extended-regexp", FlagSpec::mode(RegexMode::Extended)),
    ("basic-regexp", FlagSpec::mode(RegexMode::Basic)),
    ("fixed-strings", FlagSpec::mode(RegexMode::Fixed)),
    ("perl-regexp", FlagSpec::mode(RegexMode::Perl)),
    // Matching control
    ("regexp", FlagSpec::expression()),
    ("file", FlagSpec::expression()),
    ("ignore-case", FlagSpec::plain()),
    ("no-ignore-case", FlagSpec::plain()),
    ("word-regexp", FlagSpec::plain()),
    ("line-regexp", FlagSpec::plain()),
    ("invert-match", FlagSpec::plain()),
    // Output control
    ("count", FlagSpec::plain()),
    ("max-count", FlagSpec::with_argument()),
    ("only-matching", FlagSpec::plain()),
    ("files-with-matches", FlagSpec::plain()),
    ("files-without-match", FlagSpec::plain()),
    ("no-messages", FlagSpec::plain()),
    ("quiet", FlagSpec::unsupported(QUIET_REASON)),
    ("silent", FlagSpec::unsupported(QUIET_REASON)),
    // Output line prefix control
    ("byte-offset", FlagSpec::plain()),
    ("with-filename", FlagSpec::plain()),
    ("no-filename", FlagSpec::plain()),
    ("label", FlagSpec::with_argument()),
    ("line-number", FlagSpec::plain()),
    ("initial-tab", FlagSpec::plain()),
    ("null", FlagSpec::plain()),
    // Context line control
    ("after-context", FlagSpec::with_argument()),
    ("before-context", FlagSpec::with_argument()),
    ("context", FlagSpec::with_argument()),
    ("group-separator", FlagSpec::with_argument()),
    ("no-group-separator", FlagSpec::plain()),
    // File and directory selection
    ("text", FlagSpec::plain()),
    ("binary-files", FlagSpec::with_argument()),
    ("devices", FlagSpec::with_argument()),
    ("directories", FlagSpec::with_argument()),
    ("exclude", FlagSpec::with_argument()),
    ("exclude-from", FlagSpec::with_argument()),
    ("exclude-dir", FlagSpec::with_argument()),
    ("include", FlagSpec::with_argument()),
    ("recursive", FlagSpec::unsupported(RECURSIVE_REASON)),
    ("dereference-recursive", FlagSpec::unsupported(RECURSIVE_REASON)),
    // Other
    ("line-buffered", FlagSpec::plain()),
    ("binary", FlagSpec::plain()),
    ("null-data", FlagSpec::plain()),
];

/// Short flag letters.
pub const SHORT_FLAGS: &[(char, FlagSpec)] = &[
    ('E', FlagSpec::mode(RegexMode::Extended)),
    ('G', FlagSpec::mode(RegexMode::Basic)),
    ('F', FlagSpec::mode(RegexMode::Fixed)),
    ('P', FlagSpec::mode(RegexMode::Perl)),
    ('e', FlagSpec::expression()),
    ('f', FlagSpec::expression()),
    ('m', FlagSpec::with_argument()),
    ('A', FlagSpec::with_argument()),
    ('B', FlagSpec::with_argument()),
    ('C', FlagSpec::with_argument()),
    ('d', FlagSpec::with_argument()),
    ('D', FlagSpec::with_argument()),
    (
        'V',
        FlagSpec {
            arity: FlagArity::NoArgument,
            effect: FlagEffect::RequestVersion,
        },
    ),
    ('q', FlagSpec::unsupported(QUIET_REASON)),
    ('r', FlagSpec::unsupported(RECURSIVE_REASON)),
    ('R', FlagSpec::unsupported(RECURSIVE_REASON)),
];

/// Look up a long flag by name (no leading `--`, no `=value`).
pub fn long_flag(name: &str) -> Option<FlagSpec> {
    LONG_FLAGS
        .iter()
        .find(|(flag, _)| *flag == name)
        .map(|(_, entry)| *entry)
}

/// Look up a short flag letter; unknown letters take no argument.
pub fn short_flag(letter: char) -> FlagSpec {
    SHORT_FLAGS
        .iter()
        .find(|(flag, _)| *flag == letter)
        .map(|(_, entry)| *entry)
        .unwrap_or(FlagSpec::plain())
}
