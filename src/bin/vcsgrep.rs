//! `vcsgrep`: picks the version control system from its program name (so it
//! can be linked as `hgg` or `ggit`) or from `VCSGREP_VCS`.

use std::process::ExitCode;

use vcsgrep::cli::main_with_args;

fn main() -> ExitCode {
    let mut args = std::env::args_os();
    let program = args.next().unwrap_or_else(|| "vcsgrep".into());
    main_with_args(program, None, args)
}
