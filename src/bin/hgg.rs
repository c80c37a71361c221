//! `hgg`: grep the files tracked by Mercurial.

use std::process::ExitCode;

use vcsgrep::cli::main_with_args;
use vcsgrep::vcs::Vcs;

fn main() -> ExitCode {
    let mut args = std::env::args_os();
    let program = args.next().unwrap_or_else(|| "hgg".into());
    main_with_args(program, Some(Vcs::Mercurial), args)
}
