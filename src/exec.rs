//! Running the search backend and the editor.
//!
//! Searches run grep once per batch of files with inherited stdio. In editor
//! mode grep runs with stdin closed and its NUL-separated `-l --null` output
//! captured; the editor then gets the matched files and the terminal, one
//! batch at a time. Only one process owns the terminal at a time. While it
//! does we catch SIGINT with a handler that does nothing, so the interrupt
//! stops the child (which starts with the default disposition) and we report
//! its outcome.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use vcsgrep_core::error::VcsgrepError;
use vcsgrep_core::plan::{ProcessCommand, QueryPlan};

/// Grep status: at least one line matched.
pub const STATUS_MATCH: i32 = 0;
/// Grep status: nothing matched.
pub const STATUS_NO_MATCH: i32 = 1;
/// Grep status: an error occurred.
pub const STATUS_ERROR: i32 = 2;

/// How long `<tool> --version` may take.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Locate an executable on PATH (or verify an explicit path).
pub fn resolve_program(program: &str) -> Result<PathBuf, VcsgrepError> {
    which::which(program).map_err(|e| VcsgrepError::backend(program, e))
}

/// Exit code of a finished child; `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    STATUS_ERROR
}

/// Overall status of several grep runs: error beats match beats no match.
pub fn combine_statuses(statuses: &[i32]) -> i32 {
    if statuses.iter().any(|&s| s != STATUS_MATCH && s != STATUS_NO_MATCH) {
        STATUS_ERROR
    } else if statuses.contains(&STATUS_MATCH) {
        STATUS_MATCH
    } else {
        STATUS_NO_MATCH
    }
}

#[cfg(unix)]
extern "C" fn swallow_sigint(_: libc::c_int) {}

/// Catches and discards SIGINT in this process until dropped.
///
/// A caught signal is reset to its default action across `exec`, unlike an
/// ignored one, so children stay interruptible.
pub struct SigintGuard {
    #[cfg(unix)]
    previous: libc::sigaction,
}

impl SigintGuard {
    #[cfg(unix)]
    pub fn new() -> Self {
        // SAFETY: both structs are plain data, zeroed is a valid empty
        // value for them, and the handler is async-signal-safe.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            let handler: extern "C" fn(libc::c_int) = swallow_sigint;
            action.sa_sigaction = handler as libc::sighandler_t;
            libc::sigemptyset(&mut action.sa_mask);
            action.sa_flags = libc::SA_RESTART;
            let mut previous: libc::sigaction = std::mem::zeroed();
            libc::sigaction(libc::SIGINT, &action, &mut previous);
            SigintGuard { previous }
        }
    }

    #[cfg(not(unix))]
    pub fn new() -> Self {
        SigintGuard {}
    }
}

impl Default for SigintGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Drop for SigintGuard {
    fn drop(&mut self) {
        // SAFETY: restores the action saved in `new`.
        unsafe {
            libc::sigaction(libc::SIGINT, &self.previous, std::ptr::null_mut());
        }
    }
}

fn command_for(process: &ProcessCommand) -> Result<Command, VcsgrepError> {
    let program = resolve_program(&process.program)?;
    let mut command = Command::new(program);
    command.args(&process.args);
    for (key, value) in &process.env {
        command.env(key, value);
    }
    Ok(command)
}

/// Run the search with grep writing straight to the terminal.
///
/// Returns grep's combined status. An empty file set runs nothing and
/// reports no match.
pub fn run_search(plan: &QueryPlan, budget: usize) -> Result<i32, VcsgrepError> {
    let commands = plan.search_commands(budget);
    if commands.is_empty() {
        debug!("no files to search");
        return Ok(STATUS_NO_MATCH);
    }

    let mut statuses = Vec::with_capacity(commands.len());
    for process in &commands {
        debug!(files = process.args.len(), "running {}", process.program);
        let mut command = command_for(process)?;
        let status = {
            let _guard = SigintGuard::new();
            command
                .status()
                .map_err(|e| VcsgrepError::backend(&process.program, e))?
        };
        let code = exit_code(status);
        if status.code().is_none() {
            // killed by a signal: stop and report it
            return Ok(code);
        }
        statuses.push(code);
    }
    Ok(combine_statuses(&statuses))
}

/// Run the search for matching file names, then open them in the editor.
///
/// The editor is not started when nothing matched; the result is then grep's
/// status. Otherwise the editor runs once per batch of names, and the result
/// is the first failing editor status, or 0.
pub fn run_editor(plan: &QueryPlan, budget: usize) -> Result<i32, VcsgrepError> {
    let mut matched: Vec<String> = Vec::new();
    let mut statuses = Vec::new();

    for process in plan.search_commands(budget) {
        let mut command = command_for(&process)?;
        let output = command
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| VcsgrepError::backend(&process.program, e))?;
        statuses.push(exit_code(output.status));
        matched.extend(split_nul_names(&output.stdout));
    }

    let status = combine_statuses(&statuses);
    let editors = plan.editor_commands(&matched, budget);
    if editors.is_empty() {
        debug!("no matching files, not starting the editor");
        return Ok(status);
    }
    if status == STATUS_ERROR {
        warn!("grep reported errors; opening the files it did match");
    }

    let needs_terminal = plan.editor.is_some_and(|choice| choice.needs_terminal());
    let mut result = STATUS_MATCH;
    for editor in &editors {
        debug!(files = editor.args.len(), "starting {}", editor.program);
        let mut command = command_for(editor)?;
        let status = {
            let _guard = needs_terminal.then(SigintGuard::new);
            command
                .status()
                .map_err(|e| VcsgrepError::backend(&editor.program, e))?
        };
        let code = exit_code(status);
        if status.code().is_none() {
            return Ok(code);
        }
        if result == STATUS_MATCH {
            result = code;
        }
    }
    Ok(result)
}

fn split_nul_names(output: &[u8]) -> Vec<String> {
    output
        .split(|&b| b == 0)
        .filter(|name| !name.is_empty())
        .filter_map(|name| match std::str::from_utf8(name) {
            Ok(name) => Some(name.to_string()),
            Err(_) => {
                warn!(
                    path = %String::from_utf8_lossy(name),
                    "skipping file name that is not valid UTF-8"
                );
                None
            }
        })
        .collect()
}

/// First line of `<program> --version`, or `None` if it could not be run
/// or took longer than [`VERSION_TIMEOUT`].
pub fn tool_version(program: &str) -> Option<String> {
    let path = which::which(program).ok()?;
    let mut child = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    match child.wait_timeout(VERSION_TIMEOUT) {
        Ok(Some(status)) if status.success() => {
            let mut stdout = String::new();
            child.stdout.take()?.read_to_string(&mut stdout).ok()?;
            stdout.lines().next().map(str::to_string)
        }
        Ok(Some(_)) => None,
        Ok(None) | Err(_) => {
            warn!("{} --version did not finish", program);
            let _ = child.kill();
            let _ = child.wait(); // Reap the zombie
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_statuses() {
        assert_eq!(combine_statuses(&[1, 0, 1]), STATUS_MATCH);
        assert_eq!(combine_statuses(&[1, 1]), STATUS_NO_MATCH);
        assert_eq!(combine_statuses(&[0, 2, 0]), STATUS_ERROR);
        assert_eq!(combine_statuses(&[]), STATUS_NO_MATCH);
    }

    #[test]
    fn test_split_nul_names() {
        assert_eq!(
            split_nul_names(b"a.c\0dir/b c.h\0"),
            vec!["a.c".to_string(), "dir/b c.h".to_string()]
        );
        assert!(split_nul_names(b"").is_empty());
    }

    #[test]
    fn test_resolve_missing_program() {
        let err = resolve_program("vcsgrep-no-such-program").unwrap_err();
        assert_eq!(err.error_code().code(), 4);
        assert!(err.to_string().starts_with("vcsgrep-no-such-program: "));
    }

    #[test]
    fn test_version_of_missing_program() {
        assert_eq!(tool_version("vcsgrep-no-such-program"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_child_is_interruptible_under_guard() {
        let status = {
            let _guard = SigintGuard::new();
            Command::new("sh")
                .args(["-c", "kill -INT $$; exit 0"])
                .status()
                .unwrap()
        };
        assert_eq!(exit_code(status), 130);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_for_signal() {
        use std::os::unix::process::ExitStatusExt;
        // raw wait status: terminated by SIGINT
        assert_eq!(exit_code(ExitStatus::from_raw(libc::SIGINT)), 130);
        assert_eq!(exit_code(ExitStatus::from_raw(1 << 8)), 1);
    }
}
