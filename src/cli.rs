//! Command line front end shared by the `hgg`, `ggit` and `vcsgrep` binaries.
//!
//! The whole command line goes to the argument classifier untouched, so
//! `--help`, `--version` and friends are handled here rather than by a
//! generic parser.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use serde::Serialize;
use tracing::debug;

use vcsgrep_core::args::{classify_arguments, ClassifiedArguments, Editor};
use vcsgrep_core::error::VcsgrepError;
use vcsgrep_core::output::{emit_json, CommandTrace, Explanation};
use vcsgrep_core::plan::QueryPlan;
use vcsgrep_core::resolve::PatternGroup;

use crate::config::{init_tracing, OutputFormat, Settings, ENV_VCS};
use crate::exec::{run_editor, run_search, tool_version, STATUS_MATCH, STATUS_NO_MATCH};
use crate::vcs::{list_tracked_files, Vcs};

/// Package version reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Entry Point
// ============================================================================

/// Run one invocation and turn the outcome into a process exit code.
///
/// `program` is `argv[0]`; `fixed_vcs` is set by binaries that serve a
/// single version control system.
pub fn main_with_args(
    program: OsString,
    fixed_vcs: Option<Vcs>,
    args: impl IntoIterator<Item = OsString>,
) -> ExitCode {
    let program = program.to_string_lossy().into_owned();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => return report_error(&program, &err),
    };
    init_tracing(&settings);

    let vcs = fixed_vcs
        .or_else(|| Vcs::from_program_path(&program))
        .or(settings.vcs);
    let Some(vcs) = vcs else {
        let err = VcsgrepError::invalid_args(format!(
            "must be invoked as \"hgg\" or \"ggit\" (or set {ENV_VCS}=hg|git)"
        ));
        return report_error(&program, &err);
    };

    let tokens = match utf8_tokens(args) {
        Ok(tokens) => tokens,
        Err(err) => return report_error(vcs.command_name(), &err),
    };

    match run(vcs, &settings, &tokens) {
        Ok(status) => ExitCode::from(u8::try_from(status).unwrap_or(u8::MAX)),
        Err(err) => report_error(vcs.command_name(), &err),
    }
}

fn utf8_tokens(args: impl IntoIterator<Item = OsString>) -> Result<Vec<String>, VcsgrepError> {
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|arg| {
                VcsgrepError::invalid_args(format!(
                    "argument is not valid UTF-8: {}",
                    arg.to_string_lossy()
                ))
            })
        })
        .collect()
}

/// Print `<prog>: <message>` on stderr and map the error to its exit code.
fn report_error(program: &str, err: &VcsgrepError) -> ExitCode {
    let _ = writeln!(io::stderr(), "{}: {}", program, err);
    ExitCode::from(err.error_code().code())
}

// ============================================================================
// Orchestration
// ============================================================================

/// Run one classified invocation and return the process status.
pub fn run(vcs: Vcs, settings: &Settings, tokens: &[String]) -> Result<i32, VcsgrepError> {
    let args = classify_arguments(tokens)?;
    let directives = &args.directives;

    if directives.explain {
        let group = PatternGroup::compile(&args.patterns)?;
        let explanation = Explanation::new(&args, &group, &settings.grep);
        write_explanation(vcs, &explanation, settings.output)?;
        return Ok(STATUS_MATCH);
    }
    if directives.version {
        write_stdout(&version_report(&settings.grep))?;
        return Ok(STATUS_MATCH);
    }
    if directives.help {
        let _ = write!(io::stderr(), "{}", usage(vcs));
        return Ok(STATUS_NO_MATCH);
    }
    if !args.has_expression() {
        return Err(VcsgrepError::invalid_args(
            "no search expression given (see --help)",
        ));
    }

    // Everything the user typed is validated before anything is spawned.
    let group = PatternGroup::compile(&args.patterns)?;
    let lister = vcs.list_command(&directives.revisions)?;

    let candidates = list_tracked_files(vcs, &directives.revisions)?;
    let files = group.resolve(&candidates);
    let mut plan = QueryPlan::new(&args, files).with_grep(settings.grep.clone());
    if let Some(editor) = &settings.editor {
        plan = plan.with_editor_program(editor.clone());
    }
    debug!(files = plan.files.len(), "planned search");

    if directives.show {
        let trace = CommandTrace::new(lister, &plan, settings.batch_bytes);
        write_stdout(&format!("{}\n", trace))?;
        return Ok(STATUS_MATCH);
    }

    execute(&args, &plan, settings)
}

fn execute(
    args: &ClassifiedArguments,
    plan: &QueryPlan,
    settings: &Settings,
) -> Result<i32, VcsgrepError> {
    if args.directives.editor.is_some() {
        run_editor(plan, settings.batch_bytes)
    } else {
        run_search(plan, settings.batch_bytes)
    }
}

fn write_stdout(text: &str) -> Result<(), VcsgrepError> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| VcsgrepError::internal(format!("failed to write output: {}", e)))
}

/// JSON form of `--explain`.
#[derive(Debug, Serialize)]
pub struct ExplainReport<'a> {
    pub vcs: Vcs,
    #[serde(flatten)]
    pub explanation: &'a Explanation,
}

fn write_explanation(
    vcs: Vcs,
    explanation: &Explanation,
    format: OutputFormat,
) -> Result<(), VcsgrepError> {
    match format {
        OutputFormat::Text => write_stdout(&format!("{}\n", explanation)),
        OutputFormat::Json => emit_json(&ExplainReport { vcs, explanation }, &mut io::stdout())
            .map_err(|e| VcsgrepError::internal(format!("failed to write output: {}", e))),
    }
}

// ============================================================================
// Help and Version
// ============================================================================

/// Usage text for `--help`.
pub fn usage(vcs: Vcs) -> String {
    let prog = vcs.command_name();
    let editor_flags: Vec<&str> = Editor::ALL.iter().map(|e| e.flag()).collect();

    let mut text = format!(
        "usage: {prog} [--show] [--explain] [{pipe}] [GREP-OPTIONS] GREP-PATTERN [FILE-PATTERN]... [-X EXCLUDE-PATTERN]...
Searches for GREP-PATTERN in the files tracked by {vcs} under the current
directory, narrowed down by FILE-PATTERNs if any are given. Binary files and
symlinks are skipped, and grep runs in extended regexp mode (-E) unless
another matcher (-G, -F, -P) is selected.

Example: {prog} -i \"hello\" .h .cpp src/

See \"man grep\" for GREP-OPTIONS and GREP-PATTERN. FILE-PATTERNs are globs
(** and {{a,b}} supported) or plain file extensions such as .py. Extension
patterns are OR'd together, so are the other patterns, and a file must match
both kinds when both are given: \"{prog} TODO .c lib\" searches the .c files
under lib. -X PATTERN excludes the files PATTERN matches.

Use --show to print the commands instead of running them, {comma} to
open the matching files in an editor, and --explain to see how the arguments
were understood.
",
        pipe = editor_flags.join("|"),
        comma = editor_flags.join(" or "),
    );

    if vcs == Vcs::Mercurial {
        text.push_str(
            "
Use -r REV to search only the files changed since REV, or -r R1 -r R2 for
the files changed between revisions R1 and R2.
",
        );
    }
    text
}

/// The `--version` report: our version, then each tool's first line.
pub fn version_report(grep: &str) -> String {
    let mut report = format!("vcsgrep {}\n", VERSION);
    for tool in [grep, Vcs::Mercurial.program(), Vcs::Git.program()] {
        match tool_version(tool) {
            Some(line) => report.push_str(&line),
            None => report.push_str(&format!("{}: not found or broken", tool)),
        }
        report.push('\n');
    }
    report
}
