//! `ggit`: grep the files tracked by Git.

use std::process::ExitCode;

use vcsgrep::cli::main_with_args;
use vcsgrep::vcs::Vcs;

fn main() -> ExitCode {
    let mut args = std::env::args_os();
    let program = args.next().unwrap_or_else(|| "ggit".into());
    main_with_args(program, Some(Vcs::Git), args)
}
