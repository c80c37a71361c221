//! Core infrastructure for vcsgrep.
//!
//! This crate turns a grep-style command line into a search plan without
//! touching the filesystem or spawning anything:
//! - Filename pattern engine (extension globs, path globs, group expansion)
//! - Pattern set resolution against a candidate file list
//! - Argument classification driven by an explicit grep flag table
//! - Query plans and the explain/show renderers
//! - Error types and exit codes

pub mod args;
pub mod error;
pub mod glob;
pub mod output;
pub mod plan;
pub mod resolve;
