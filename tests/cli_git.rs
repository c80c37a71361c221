//! Integration tests running the built binaries against a scratch Git
//! repository.
//!
//! Tests that need `git` or `grep` return early when either is missing.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const GGIT: &str = env!("CARGO_BIN_EXE_ggit");
const VCSGREP: &str = env!("CARGO_BIN_EXE_vcsgrep");

fn tools_available() -> bool {
    which::which("git").is_ok() && which::which("grep").is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("run git");
    assert!(status.success(), "git {:?} failed", args);
}

/// A repository with a few tracked files, one untracked file and a symlink.
fn scratch_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = dir.path();
    git(root, &["init", "-q"]);

    fs::create_dir_all(root.join("src/External")).unwrap();
    fs::write(root.join("main.c"), "int needle = 1;\n").unwrap();
    fs::write(root.join("src/util.c"), "/* needle */\n").unwrap();
    fs::write(root.join("src/util.h"), "#define NEEDLE 1\n").unwrap();
    fs::write(root.join("src/External/zlib.c"), "needle\n").unwrap();
    fs::write(root.join("notes.txt"), "needle in the notes\n").unwrap();
    fs::write(root.join("untracked.c"), "needle\n").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink("main.c", root.join("link.c")).unwrap();

    git(
        root,
        &[
            "add",
            "main.c",
            "src/util.c",
            "src/util.h",
            "src/External/zlib.c",
            "notes.txt",
        ],
    );
    #[cfg(unix)]
    git(root, &["add", "link.c"]);
    dir
}

/// A command for `program` in `dir` with none of our settings inherited.
fn command_in(program: &str, dir: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("VCSGREP_VCS")
        .env_remove("VCSGREP_LOG")
        .env_remove("VCSGREP_OUTPUT")
        .env_remove("VCSGREP_GREP")
        .env_remove("VCSGREP_BATCH_BYTES")
        .env_remove("VCSGREP_EDITOR");
    command
}

fn run_in(program: &str, dir: &Path, args: &[&str]) -> Output {
    command_in(program, dir, args).output().expect("run binary")
}

/// A stand-in editor that appends its arguments, one per line, to `log`.
#[cfg(unix)]
fn recording_editor(dir: &Path, log: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("editor.sh");
    fs::write(
        &script,
        format!("#!/bin/sh\nprintf '%s\\n' \"$@\" >> '{}'\n", log.display()),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Searching
// ============================================================================

#[test]
fn search_tracked_c_files() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let output = run_in(GGIT, repo.path(), &["needle", ".c"]);

    assert_eq!(output.status.code(), Some(0));
    let mut lines = stdout_lines(&output);
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "main.c:int needle = 1;",
            "src/External/zlib.c:needle",
            "src/util.c:/* needle */",
        ]
    );
}

#[test]
fn search_with_exclude_and_grep_options() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let output = run_in(GGIT, repo.path(), &["-i", "needle", "src", "-X", "External"]);

    assert_eq!(output.status.code(), Some(0));
    let mut lines = stdout_lines(&output);
    lines.sort();
    assert_eq!(
        lines,
        vec!["src/util.c:/* needle */", "src/util.h:#define NEEDLE 1"]
    );
}

#[test]
fn no_match_exits_one() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let output = run_in(GGIT, repo.path(), &["haystack"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn empty_selection_exits_one() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let output = run_in(GGIT, repo.path(), &["needle", ".rs"]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Editor Mode
// ============================================================================

#[cfg(unix)]
#[test]
fn editor_opens_matching_files() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let tools = tempfile::tempdir().unwrap();
    let log = tools.path().join("editor.log");
    let editor = recording_editor(tools.path(), &log);

    let output = command_in(GGIT, repo.path(), &["--gvim", "needle", ".c"])
        .env("VCSGREP_EDITOR", &editor)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    let mut opened: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    opened.sort();
    assert_eq!(opened, vec!["main.c", "src/External/zlib.c", "src/util.c"]);
}

#[cfg(unix)]
#[test]
fn editor_not_started_without_matches() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let tools = tempfile::tempdir().unwrap();
    let log = tools.path().join("editor.log");
    let editor = recording_editor(tools.path(), &log);

    let output = command_in(GGIT, repo.path(), &["--gvim", "haystack"])
        .env("VCSGREP_EDITOR", &editor)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!log.exists());
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn show_prints_commands() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let output = run_in(GGIT, repo.path(), &["--show", "needle", ".c", "-X", "External"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_lines(&output),
        vec![
            "git ls-files --stage -z",
            "grep --binary-files=without-match -H -E --color -e needle -- main.c src/util.c",
        ]
    );
}

#[test]
fn show_in_editor_mode_prints_pipe() {
    if !tools_available() {
        return;
    }
    let repo = scratch_repo();
    let output = run_in(GGIT, repo.path(), &["--show", "--vim", "needle", "notes.txt"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_lines(&output),
        vec![
            "git ls-files --stage -z",
            "grep --binary-files=without-match -H -E -l --null -e needle -- notes.txt",
            "| xargs -0 --no-run-if-empty vim",
        ]
    );
}

#[test]
fn explain_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(GGIT)
        .args(["--explain", "TODO", ".{c,h}", "-X", "External"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("VCSGREP_OUTPUT", "json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["vcs"], "git");
    assert_eq!(report["expression"], "TODO");
    assert_eq!(report["patterns"][0]["pattern"], ".{c,h}");
    assert_eq!(report["patterns"][0]["kind"], "extension_glob");
    assert_eq!(report["patterns"][1]["pattern"], "External");
    assert_eq!(report["patterns"][1]["exclude"], true);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn unsupported_flag_fails_before_listing() {
    // no repository here: the listing would fail with status 3
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(GGIT, dir.path(), &["-q", "needle"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("ggit: unsupported option -q"), "{}", stderr);
}

#[test]
fn outside_a_repository_is_a_vcs_error() {
    if !tools_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(GGIT, dir.path(), &["needle"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn help_goes_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(GGIT, dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("usage: ggit "));
}

#[test]
fn generic_binary_needs_a_vcs() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(VCSGREP, dir.path(), &["needle"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be invoked as"));

    let output = Command::new(VCSGREP)
        .args(["-h"])
        .current_dir(dir.path())
        .env("VCSGREP_VCS", "hg")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("usage: hgg "));
}
