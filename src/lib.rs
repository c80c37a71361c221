//! vcsgrep: grep the files tracked by Mercurial or Git.
//!
//! The `hgg` and `ggit` front ends list the tracked regular files, narrow
//! them down with extension and path globs, and run grep (or an editor) on
//! the result.

// Core infrastructure - re-exported from vcsgrep-core
pub use vcsgrep_core::args;
pub use vcsgrep_core::error;
pub use vcsgrep_core::glob;
pub use vcsgrep_core::output;
pub use vcsgrep_core::plan;
pub use vcsgrep_core::resolve;

// Front end and process plumbing
pub mod cli;
pub mod config;
pub mod exec;
pub mod vcs;
