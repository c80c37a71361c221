//! Tracked file listing.
//!
//! The candidate files for a search are the regular files version control
//! tracks. Symlinks are always dropped (grep would follow them out of the
//! repository), and so are Git submodules.
//!
//! - Git: `git ls-files --stage -z`, keeping entries whose mode is `100xxx`.
//! - Mercurial: `hg files --print0 --verbose`, dropping entries whose flag
//!   column is `l`. With revisions, `hg status` lists the files changed since
//!   (or between) them.

use std::fmt;
use std::io;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::bytes::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use vcsgrep_core::error::VcsgrepError;
use vcsgrep_core::plan::ProcessCommand;

use crate::exec::{exit_code, resolve_program};

/// `hg files --verbose` entry: right-aligned size, flag, path.
static HG_VERBOSE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s-u)^.{9}[0-9] (.) (.*)$").unwrap());

/// Version control system whose tracked files are searched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vcs {
    #[value(name = "hg", alias = "mercurial")]
    Mercurial,
    #[value(name = "git")]
    Git,
}

impl Vcs {
    /// The version control executable.
    pub fn program(self) -> &'static str {
        match self {
            Vcs::Mercurial => "hg",
            Vcs::Git => "git",
        }
    }

    /// The name the tool goes by for this system.
    pub fn command_name(self) -> &'static str {
        match self {
            Vcs::Mercurial => "hgg",
            Vcs::Git => "ggit",
        }
    }

    /// Work out the system from the invoked program path.
    pub fn from_program_path(path: &str) -> Option<Self> {
        if path.ends_with("hgg") {
            return Some(Vcs::Mercurial);
        }
        let is_ggit_word = path
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .any(|word| word == "ggit");
        if path.ends_with("ggit") || is_ggit_word {
            return Some(Vcs::Git);
        }
        None
    }

    /// The listing command for this system.
    pub fn list_command(self, revisions: &[String]) -> Result<ProcessCommand, ListError> {
        match self {
            Vcs::Git if !revisions.is_empty() => Err(ListError::RevisionsUnsupported { vcs: self }),
            Vcs::Git => Ok(ProcessCommand::new("git").args(["ls-files", "--stage", "-z"])),
            Vcs::Mercurial if revisions.is_empty() => Ok(ProcessCommand::new("hg")
                .args(["files", "--print0", "--verbose"])
                .env("HGPLAIN", "1")),
            Vcs::Mercurial => Ok(ProcessCommand::new("hg")
                .args(["status", "--print0", "--no-status", "-X", "set:symlink()"])
                .args(revisions.iter().flat_map(|rev| ["--rev".to_string(), rev.clone()]))
                .env("HGPLAIN", "1")),
        }
    }

    /// Extract the candidate paths from the listing command's output.
    pub fn parse_listing(self, revisions: bool, output: &[u8]) -> Vec<String> {
        let entries = output.split(|&b| b == 0).filter(|entry| !entry.is_empty());
        let mut paths: Vec<String> = Vec::new();
        for entry in entries {
            let path = match (self, revisions) {
                (Vcs::Git, _) => git_stage_path(entry),
                (Vcs::Mercurial, false) => hg_verbose_path(entry),
                (Vcs::Mercurial, true) => Some(entry),
            };
            let Some(path) = path else {
                continue;
            };
            match std::str::from_utf8(path) {
                // unmerged entries list a path once per stage
                Ok(path) if paths.last().is_some_and(|last| last == path) => {}
                Ok(path) => paths.push(path.to_string()),
                Err(_) => warn!(
                    path = %String::from_utf8_lossy(path),
                    "skipping path that is not valid UTF-8"
                ),
            }
        }
        paths
    }
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vcs::Mercurial => write!(f, "Mercurial"),
            Vcs::Git => write!(f, "Git"),
        }
    }
}

/// `<mode> <object> <stage>\t<path>`; only regular files (`100xxx`).
fn git_stage_path(entry: &[u8]) -> Option<&[u8]> {
    if !entry.starts_with(b"100") {
        return None;
    }
    let tab = entry.iter().position(|&b| b == b'\t')?;
    Some(&entry[tab + 1..])
}

fn hg_verbose_path(entry: &[u8]) -> Option<&[u8]> {
    let captures = HG_VERBOSE_ENTRY.captures(entry)?;
    if &captures[1] == b"l" {
        return None;
    }
    captures.get(2).map(|m| m.as_bytes())
}

/// Error type for file listing.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("--rev is not implemented for {vcs}")]
    RevisionsUnsupported { vcs: Vcs },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with status {status}{}", format_stderr(.stderr))]
    Failed {
        program: String,
        status: i32,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl From<ListError> for VcsgrepError {
    fn from(err: ListError) -> Self {
        VcsgrepError::vcs(err.to_string())
    }
}

/// Run the listing command and return the tracked regular files.
pub fn list_tracked_files(vcs: Vcs, revisions: &[String]) -> Result<Vec<String>, VcsgrepError> {
    let command = vcs.list_command(revisions)?;
    let program = resolve_program(&command.program)?;
    debug!(command = %command, "listing tracked files");

    let output = Command::new(&program)
        .args(&command.args)
        .envs(command.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ListError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ListError::Failed {
            program: command.program,
            status: exit_code(output.status),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    let paths = vcs.parse_listing(!revisions.is_empty(), &output.stdout);
    debug!(files = paths.len(), "listed tracked files");
    Ok(paths)
}
