//! Query plans: the exact processes a search turns into.
//!
//! A [`QueryPlan`] is plain data. It knows how to build the grep command for
//! any batch of files and the editor commands for the files grep reported,
//! but it never runs anything.

use std::fmt;

use serde::Serialize;

use crate::args::{ClassifiedArguments, Editor, RegexMode};
use crate::resolve::FileSet;

/// Default search backend.
pub const DEFAULT_GREP: &str = "grep";

/// Flags every search starts with: skip binary files, always print names.
pub const BASE_GREP_ARGS: [&str; 2] = ["--binary-files=without-match", "-H"];

/// Flags replacing the color argument when an editor is selected.
pub const LIST_FILES_ARGS: [&str; 2] = ["-l", "--null"];

/// Default byte budget for the file names of one grep invocation.
pub const DEFAULT_BATCH_BYTES: usize = 128 * 1024;

// ============================================================================
// Process Commands
// ============================================================================

/// A process to spawn: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>) -> Self {
        ProcessCommand {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render as a shell command line, environment assignments first.
    pub fn render(&self) -> String {
        let assignments = self
            .env
            .iter()
            .map(|(key, value)| format!("{key}={}", quote(value)));
        let words = std::iter::once(&self.program)
            .chain(&self.args)
            .map(|word| quote(word));
        assignments.chain(words).collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Shell-quote one word.
///
/// Words made only of characters no shell treats specially stay bare.
pub fn quote(word: &str) -> String {
    let bare = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "%+,-./:=@_".contains(c));
    if bare {
        return word.to_string();
    }
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| "<NUL>".to_string())
}

// ============================================================================
// Search Request
// ============================================================================

/// Everything grep needs apart from the file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub pass_through: Vec<String>,
    pub regex_mode: RegexMode,
    pub regex_mode_explicit: bool,
    pub expression: Option<String>,
    pub color: String,
}

impl From<&ClassifiedArguments> for SearchRequest {
    fn from(args: &ClassifiedArguments) -> Self {
        SearchRequest {
            pass_through: args.pass_through.clone(),
            regex_mode: args.regex_mode,
            regex_mode_explicit: args.regex_mode_explicit,
            expression: args.expression.clone(),
            color: args.directives.color.clone(),
        }
    }
}

// ============================================================================
// Query Plan
// ============================================================================

/// The resolved search: request, editor choice and file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub request: SearchRequest,
    pub editor: Option<Editor>,
    pub files: FileSet,
    grep: String,
    editor_program: Option<String>,
}

impl QueryPlan {
    pub fn new(args: &ClassifiedArguments, files: FileSet) -> Self {
        QueryPlan {
            request: SearchRequest::from(args),
            editor: args.directives.editor,
            files,
            grep: DEFAULT_GREP.to_string(),
            editor_program: None,
        }
    }

    /// Use a different grep executable.
    pub fn with_grep(mut self, program: impl Into<String>) -> Self {
        self.grep = program.into();
        self
    }

    pub fn grep_program(&self) -> &str {
        &self.grep
    }

    /// Run a different executable in place of the selected editor.
    pub fn with_editor_program(mut self, program: impl Into<String>) -> Self {
        self.editor_program = Some(program.into());
        self
    }

    /// The executable that opens matches, if an editor was selected.
    pub fn editor_program(&self) -> Option<&str> {
        let editor = self.editor?;
        Some(self.editor_program.as_deref().unwrap_or(editor.program()))
    }

    /// Grep arguments up to and including the `--` before the file names.
    ///
    /// The implicit expression goes in as `-e EXPR` so an expression that
    /// starts with `-` is never read as a flag.
    pub fn search_args(&self) -> Vec<String> {
        let request = &self.request;
        let mut args: Vec<String> = BASE_GREP_ARGS.iter().map(|a| a.to_string()).collect();
        if !request.regex_mode_explicit {
            args.push(request.regex_mode.flag().to_string());
        }
        args.extend(request.pass_through.iter().cloned());
        if self.editor.is_some() {
            args.extend(LIST_FILES_ARGS.iter().map(|a| a.to_string()));
        } else {
            args.push(request.color.clone());
        }
        if let Some(expression) = &request.expression {
            args.push("-e".to_string());
            args.push(expression.clone());
        }
        args.push("--".to_string());
        args
    }

    /// The grep command for one batch of files.
    pub fn search_command(&self, batch: &[String]) -> ProcessCommand {
        ProcessCommand::new(&self.grep)
            .args(self.search_args())
            .args(batch.iter().cloned())
    }

    /// One grep command per batch of the file set.
    pub fn search_commands(&self, budget: usize) -> Vec<ProcessCommand> {
        batch_files(self.files.as_slice(), budget)
            .into_iter()
            .map(|batch| self.search_command(batch))
            .collect()
    }

    /// Editor commands for the files grep reported, batched like the
    /// searches. Empty when no editor was selected or nothing matched.
    pub fn editor_commands(&self, matched: &[String], budget: usize) -> Vec<ProcessCommand> {
        let Some(program) = self.editor_program() else {
            return Vec::new();
        };
        batch_files(matched, budget)
            .into_iter()
            .map(|batch| ProcessCommand::new(program).args(batch.iter().cloned()))
            .collect()
    }
}

/// Split files into consecutive batches whose names fit in `budget` bytes.
///
/// Each name costs its length plus one. A name larger than the budget gets a
/// batch of its own.
pub fn batch_files(files: &[String], budget: usize) -> Vec<&[String]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (i, file) in files.iter().enumerate() {
        let cost = file.len() + 1;
        if i > start && used + cost > budget {
            batches.push(&files[start..i]);
            start = i;
            used = 0;
        }
        used += cost;
    }
    if start < files.len() {
        batches.push(&files[start..]);
    }
    batches
}
