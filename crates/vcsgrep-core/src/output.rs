//! Diagnostic output: the `--explain` and `--show` traces.
//!
//! `--explain` reports how the command line was understood, with every file
//! pattern expanded into the predicates it compiled to. It renders as text or
//! as JSON. `--show` prints the literal commands a search would run.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::args::{ClassifiedArguments, Directives, RegexMode};
use crate::glob::PatternKind;
use crate::plan::{quote, ProcessCommand, QueryPlan};
use crate::resolve::{Bucket, FileSet, PatternGroup};

// ============================================================================
// Explain
// ============================================================================

/// How one file pattern was understood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternExplanation {
    pub pattern: String,
    pub kind: PatternKind,
    pub bucket: Bucket,
    pub exclude: bool,
    /// Descriptions of the compiled predicates, OR'd.
    pub predicates: Vec<String>,
}

/// How a whole command line was understood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub expression: Option<String>,
    pub expression_flag_supplied: bool,
    pub regex_mode: RegexMode,
    pub regex_mode_explicit: bool,
    pub pass_through: Vec<String>,
    pub patterns: Vec<PatternExplanation>,
    pub directives: Directives,
    /// The grep executable.
    pub grep: String,
    /// The grep arguments before the file names.
    pub grep_args: Vec<String>,
}

impl Explanation {
    pub fn new(args: &ClassifiedArguments, group: &PatternGroup, grep: &str) -> Self {
        let patterns = group
            .entries()
            .map(|(bucket, compiled)| PatternExplanation {
                pattern: compiled.raw.text.clone(),
                kind: compiled.kind,
                bucket,
                exclude: compiled.raw.exclude,
                predicates: compiled.predicates.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        let plan = QueryPlan::new(args, FileSet::default()).with_grep(grep);

        Explanation {
            expression: args.expression.clone(),
            expression_flag_supplied: args.expression_flag_supplied,
            regex_mode: args.regex_mode,
            regex_mode_explicit: args.regex_mode_explicit,
            pass_through: args.pass_through.clone(),
            patterns,
            directives: args.directives.clone(),
            grep: plan.grep_program().to_string(),
            grep_args: plan.search_args(),
        }
    }
}

fn join_quoted(words: &[String]) -> String {
    words
        .iter()
        .map(|word| quote(word))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.expression, self.expression_flag_supplied) {
            (Some(expression), _) => writeln!(f, "expression: {}", quote(expression))?,
            (None, true) => writeln!(f, "expression: (from -e/-f)")?,
            (None, false) => writeln!(f, "expression: (none)")?,
        }
        let origin = if self.regex_mode_explicit {
            "selected"
        } else {
            "default"
        };
        writeln!(f, "regex mode: {} ({})", self.regex_mode, origin)?;
        if !self.pass_through.is_empty() {
            writeln!(f, "grep options: {}", join_quoted(&self.pass_through))?;
        }

        let directives = &self.directives;
        writeln!(f, "color: {}", directives.color)?;
        if let Some(editor) = directives.editor {
            writeln!(f, "editor: {}", editor)?;
        }
        if !directives.revisions.is_empty() {
            writeln!(f, "revisions: {}", join_quoted(&directives.revisions))?;
        }
        if directives.show {
            writeln!(f, "show: yes")?;
        }

        if self.patterns.is_empty() {
            writeln!(f, "file patterns: (none, all tracked files)")?;
        } else {
            writeln!(f, "file patterns:")?;
            for pattern in &self.patterns {
                writeln!(f, "  {} ({}, {})", pattern.pattern, pattern.kind, pattern.bucket)?;
                for predicate in &pattern.predicates {
                    writeln!(f, "    {}", predicate)?;
                }
            }
        }

        write!(f, "grep: {} {}", quote(&self.grep), join_quoted(&self.grep_args))
    }
}

/// Emit any serializable value as pretty JSON.
pub fn emit_json<T: Serialize>(value: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Show
// ============================================================================

/// Argument list of the editor stage shown in editor mode.
pub const EDITOR_PIPE: [&str; 3] = ["xargs", "-0", "--no-run-if-empty"];

/// The commands a search runs, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTrace {
    pub lister: ProcessCommand,
    pub searches: Vec<ProcessCommand>,
    /// The editor stage, fed with the names the searches print.
    pub editor: Option<ProcessCommand>,
}

impl CommandTrace {
    pub fn new(lister: ProcessCommand, plan: &QueryPlan, budget: usize) -> Self {
        let editor = plan.editor_program().map(|program| {
            ProcessCommand::new(EDITOR_PIPE[0])
                .args(EDITOR_PIPE[1..].iter().copied())
                .arg(program)
        });
        CommandTrace {
            lister,
            searches: plan.search_commands(budget),
            editor,
        }
    }
}

impl fmt::Display for CommandTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lister)?;
        for search in &self.searches {
            write!(f, "\n{}", search)?;
        }
        if let Some(editor) = &self.editor {
            write!(f, "\n| {}", editor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::classify_arguments;

    fn explain(tokens: &[&str]) -> Explanation {
        let args = classify_arguments(tokens).unwrap();
        let group = PatternGroup::compile(&args.patterns).unwrap();
        Explanation::new(&args, &group, "grep")
    }

    // =========================================================================
    // Explain
    // =========================================================================

    #[test]
    fn test_explain_patterns_in_order() {
        let explanation = explain(&["TODO", "-X", "External", ".{c,h}", "src"]);
        let patterns: Vec<(&str, Bucket)> = explanation
            .patterns
            .iter()
            .map(|p| (p.pattern.as_str(), p.bucket))
            .collect();
        assert_eq!(
            patterns,
            vec![
                ("External", Bucket::PathExcludes),
                (".{c,h}", Bucket::ExtensionIncludes),
                ("src", Bucket::PathIncludes),
            ]
        );
        assert_eq!(explanation.patterns[1].predicates, vec!["suffix in {.c, .h}"]);
    }

    #[test]
    fn test_explain_text() {
        let text = explain(&["-i", "hello world", ".py"]).to_string();
        assert_eq!(
            text,
            "expression: 'hello world'\n\
             regex mode: extended (default)\n\
             grep options: -i\n\
             color: --color\n\
             file patterns:\n  \
             .py (extension glob, extension include)\n    \
             suffix in {.py}\n\
             grep: grep --binary-files=without-match -H -E -i --color -e 'hello world' --"
        );
    }

    #[test]
    fn test_explain_names_configured_grep() {
        let args = classify_arguments(&["hello"]).unwrap();
        let group = PatternGroup::compile(&args.patterns).unwrap();
        let explanation = Explanation::new(&args, &group, "ggrep");
        assert_eq!(explanation.grep, "ggrep");
        let text = explanation.to_string();
        assert!(text.ends_with(
            "grep: ggrep --binary-files=without-match -H -E --color -e hello --"
        ));
    }

    #[test]
    fn test_explain_text_without_patterns() {
        let text = explain(&["-e", "x", "-G"]).to_string();
        assert!(text.contains("expression: (from -e/-f)"));
        assert!(text.contains("regex mode: basic (selected)"));
        assert!(text.contains("file patterns: (none, all tracked files)"));
    }

    #[test]
    fn test_explain_json() {
        let explanation = explain(&["--gvim", "-r", "tip", "hello", "lib"]);
        let mut out = Vec::new();
        emit_json(&explanation, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["expression"], "hello");
        assert_eq!(value["regex_mode"], "extended");
        assert_eq!(value["directives"]["editor"], "gvim");
        assert_eq!(value["directives"]["revisions"][0], "tip");
        assert_eq!(value["patterns"][0]["kind"], "path_glob");
        assert_eq!(value["patterns"][0]["bucket"], "path_includes");
    }

    // =========================================================================
    // Show
    // =========================================================================

    #[test]
    fn test_show_trace() {
        let args = classify_arguments(&["hello", ".c"]).unwrap();
        let plan = QueryPlan::new(&args, FileSet::from(vec!["a.c".to_string()]));
        let lister = ProcessCommand::new("git").args(["ls-files", "--stage", "-z"]);
        let trace = CommandTrace::new(lister, &plan, 1024);
        assert_eq!(
            trace.to_string(),
            "git ls-files --stage -z\n\
             grep --binary-files=without-match -H -E --color -e hello -- a.c"
        );
    }

    #[test]
    fn test_show_trace_with_editor() {
        let args = classify_arguments(&["--vim", "hello"]).unwrap();
        let plan = QueryPlan::new(&args, FileSet::from(vec!["a.c".to_string()]));
        let lister = ProcessCommand::new("hg")
            .args(["files", "--print0", "--verbose"])
            .env("HGPLAIN", "1");
        let trace = CommandTrace::new(lister, &plan, 1024);
        let text = trace.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "HGPLAIN=1 hg files --print0 --verbose");
        assert!(lines[1].contains("-l --null -e hello -- a.c"));
        assert_eq!(lines[2], "| xargs -0 --no-run-if-empty vim");
    }

    #[test]
    fn test_show_trace_names_editor_override() {
        let args = classify_arguments(&["--gvim", "hello"]).unwrap();
        let plan = QueryPlan::new(&args, FileSet::default()).with_editor_program("my-gvim");
        let trace = CommandTrace::new(ProcessCommand::new("git"), &plan, 1024);
        assert_eq!(
            trace.editor.map(|e| e.render()).as_deref(),
            Some("xargs -0 --no-run-if-empty my-gvim")
        );
    }
}
