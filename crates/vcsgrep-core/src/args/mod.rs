//! Argument classification.
//!
//! The command line is one flat token stream mixing our own flags, grep
//! flags, the search expression and file patterns. [`classify_arguments`]
//! walks it once and sorts every token into [`ClassifiedArguments`]:
//!
//! ```
//! use vcsgrep_core::args::{classify_arguments, RegexMode};
//!
//! let args = classify_arguments(&["-iC3", "TODO", ".rs", "-X", "vendor"]).unwrap();
//! assert_eq!(args.pass_through, vec!["-iC3"]);
//! assert_eq!(args.expression.as_deref(), Some("TODO"));
//! assert_eq!(args.regex_mode, RegexMode::Extended);
//! assert_eq!(args.patterns.len(), 2);
//! assert!(args.patterns[1].exclude);
//! ```
//!
//! Which grep flags take an argument comes from the [`flags`] table, so
//! `-C 3` keeps `3` with its flag instead of reading it as a file pattern.

pub mod flags;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::glob::RawPattern;
use flags::{long_flag, short_flag, FlagArity, FlagEffect};

/// Color argument handed to grep unless overridden.
pub const DEFAULT_COLOR: &str = "--color";

// ============================================================================
// Types
// ============================================================================

/// Regex syntax selected for grep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexMode {
    /// `-E`, the default.
    #[default]
    Extended,
    /// `-G`
    Basic,
    /// `-F`
    Fixed,
    /// `-P`
    Perl,
}

impl RegexMode {
    /// The grep flag selecting this mode.
    pub fn flag(&self) -> &'static str {
        match self {
            RegexMode::Extended => "-E",
            RegexMode::Basic => "-G",
            RegexMode::Fixed => "-F",
            RegexMode::Perl => "-P",
        }
    }
}

impl fmt::Display for RegexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegexMode::Extended => "extended",
            RegexMode::Basic => "basic",
            RegexMode::Fixed => "fixed",
            RegexMode::Perl => "perl",
        };
        f.write_str(name)
    }
}

/// Editor that receives the matching files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Editor {
    Vim,
    Gvim,
}

impl Editor {
    /// Every supported editor, in help text order.
    pub const ALL: [Editor; 2] = [Editor::Vim, Editor::Gvim];

    pub fn program(&self) -> &'static str {
        match self {
            Editor::Vim => "vim",
            Editor::Gvim => "gvim",
        }
    }

    /// The command line flag selecting this editor.
    pub fn flag(&self) -> &'static str {
        match self {
            Editor::Vim => "--vim",
            Editor::Gvim => "--gvim",
        }
    }

    /// Terminal editors read keystrokes from stdin.
    pub fn needs_terminal(&self) -> bool {
        matches!(self, Editor::Vim)
    }

    fn from_flag(flag: &str) -> Option<Self> {
        Editor::ALL.into_iter().find(|editor| editor.flag() == flag)
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Our own flags, recorded rather than forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directives {
    pub explain: bool,
    pub show: bool,
    pub version: bool,
    pub help: bool,
    pub editor: Option<Editor>,
    /// Revisions from `-r`/`--rev`, in order.
    pub revisions: Vec<String>,
    /// `--color[=WHEN]` as given (last wins).
    pub color: String,
}

impl Default for Directives {
    fn default() -> Self {
        Directives {
            explain: false,
            show: false,
            version: false,
            help: false,
            editor: None,
            revisions: Vec::new(),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// The result of classifying one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedArguments {
    /// Grep flags and their arguments, in command line order.
    pub pass_through: Vec<String>,
    pub regex_mode: RegexMode,
    /// Set when a matcher flag chose the mode; grep then gets no `-E`.
    pub regex_mode_explicit: bool,
    /// The implicit search expression (first bare token).
    pub expression: Option<String>,
    /// Set when `-e`/`-f` (or their long forms) supply the expression.
    pub expression_flag_supplied: bool,
    /// File patterns, in command line order.
    pub patterns: Vec<RawPattern>,
    pub directives: Directives,
}

impl ClassifiedArguments {
    /// Returns true if grep has something to search for.
    pub fn has_expression(&self) -> bool {
        self.expression.is_some() || self.expression_flag_supplied
    }

    fn expects_expression(&self) -> bool {
        !self.has_expression()
    }
}

/// Error type for argument classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A grep flag that cannot work through this tool.
    #[error("unsupported option {flag}: {reason}")]
    UnsupportedOption { flag: String, reason: &'static str },

    /// A flag that takes an argument ended the command line.
    #[error("option {flag} requires an argument")]
    MissingArgument { flag: String },
}

// ============================================================================
// Classifier
// ============================================================================

/// What the token after an argument-taking flag is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    PassThrough,
    Revision,
    Exclude,
}

#[derive(Debug)]
enum State {
    Scan,
    AwaitArgument { role: Role, flag: String },
}

/// Classify the tokens following the program name.
pub fn classify_arguments<S: AsRef<str>>(
    tokens: &[S],
) -> Result<ClassifiedArguments, ClassifyError> {
    let mut args = ClassifiedArguments::default();
    let mut state = State::Scan;
    let mut options_ended = false;

    match tokens {
        [] => args.directives.help = true,
        [only] if only.as_ref() == "-h" => args.directives.help = true,
        _ => {}
    }

    for token in tokens.iter().map(|token| token.as_ref()) {
        if let State::AwaitArgument { role, .. } = state {
            match role {
                Role::PassThrough => args.pass_through.push(token.to_string()),
                Role::Revision => args.directives.revisions.push(token.to_string()),
                Role::Exclude => args.patterns.push(RawPattern::exclude(token)),
            }
            state = State::Scan;
            continue;
        }

        if options_ended || !is_flag(token) {
            operand(&mut args, token);
            continue;
        }

        if token == "--" {
            options_ended = true;
        } else if let Some(long) = token.strip_prefix("--") {
            state = long_option(&mut args, token, long)?;
        } else {
            state = short_option(&mut args, token)?;
        }
    }

    if let State::AwaitArgument { flag, .. } = state {
        return Err(ClassifyError::MissingArgument { flag });
    }

    debug!(
        pass_through = args.pass_through.len(),
        patterns = args.patterns.len(),
        mode = %args.regex_mode,
        "classified arguments"
    );
    Ok(args)
}

fn is_flag(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('-')
}

fn await_argument(role: Role, flag: &str) -> State {
    State::AwaitArgument {
        role,
        flag: flag.to_string(),
    }
}

/// A bare token: the implicit expression first, file patterns after it.
fn operand(args: &mut ClassifiedArguments, token: &str) {
    if args.expects_expression() {
        args.expression = Some(token.to_string());
    } else {
        args.patterns.push(RawPattern::include(token));
    }
}

fn long_option(
    args: &mut ClassifiedArguments,
    token: &str,
    long: &str,
) -> Result<State, ClassifyError> {
    let (name, value) = match long.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (long, None),
    };

    // Our own long flags.
    match (name, value) {
        ("explain", None) => args.directives.explain = true,
        ("show", None) => args.directives.show = true,
        ("version", None) => args.directives.version = true,
        ("help", None) => args.directives.help = true,
        ("vim" | "gvim", None) => args.directives.editor = Editor::from_flag(token),
        ("color" | "colour", _) => args.directives.color = token.to_string(),
        ("rev", Some(rev)) => args.directives.revisions.push(rev.to_string()),
        ("rev", None) => return Ok(await_argument(Role::Revision, token)),
        _ => return grep_long_option(args, token, name, value.is_some()),
    }
    Ok(State::Scan)
}

fn grep_long_option(
    args: &mut ClassifiedArguments,
    token: &str,
    name: &str,
    has_value: bool,
) -> Result<State, ClassifyError> {
    args.pass_through.push(token.to_string());

    let Some(entry) = long_flag(name) else {
        return Ok(State::Scan);
    };
    if let FlagArity::Unsupported(reason) = entry.arity {
        return Err(ClassifyError::UnsupportedOption {
            flag: format!("--{name}"),
            reason,
        });
    }
    apply_effect(args, entry.effect);
    if entry.takes_argument() && !has_value {
        return Ok(await_argument(Role::PassThrough, token));
    }
    Ok(State::Scan)
}

fn short_option(args: &mut ClassifiedArguments, token: &str) -> Result<State, ClassifyError> {
    if token == "-X" {
        return Ok(await_argument(Role::Exclude, token));
    }
    if token == "-r" {
        return Ok(await_argument(Role::Revision, token));
    }
    if let Some(rev) = token.strip_prefix("-r") {
        args.directives.revisions.push(rev.to_string());
        return Ok(State::Scan);
    }
    args.pass_through.push(token.to_string());

    let letters: Vec<char> = token.chars().skip(1).collect();
    for (i, &letter) in letters.iter().enumerate() {
        let entry = short_flag(letter);
        if let FlagArity::Unsupported(reason) = entry.arity {
            return Err(ClassifyError::UnsupportedOption {
                flag: format!("-{letter}"),
                reason,
            });
        }
        apply_effect(args, entry.effect);
        if entry.takes_argument() {
            // -C3 carries its argument; a trailing -C takes the next token.
            if i == letters.len() - 1 {
                return Ok(await_argument(Role::PassThrough, &format!("-{letter}")));
            }
            break;
        }
    }
    Ok(State::Scan)
}

fn apply_effect(args: &mut ClassifiedArguments, effect: FlagEffect) {
    match effect {
        FlagEffect::None => {}
        FlagEffect::SelectMode(mode) => {
            args.regex_mode = mode;
            args.regex_mode_explicit = true;
        }
        FlagEffect::SuppliesExpression => args.expression_flag_supplied = true,
        FlagEffect::RequestVersion => args.directives.version = true,
    }
}
