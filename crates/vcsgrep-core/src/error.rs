//! Error types and exit codes for vcsgrep.
//!
//! `VcsgrepError` is the single error type the command line front end deals
//! with. Pattern and classification errors from the core bridge into it, and
//! the front end adds version control, backend and configuration failures.
//!
//! ## Exit Codes
//!
//! - `2`: invalid arguments, patterns or configuration
//! - `3`: version control failure (listing failed, unsupported feature)
//! - `4`: search backend or editor failure
//! - `10`: internal errors
//!
//! A search that simply finds nothing is not an error; it exits with grep's
//! own status (1).

use std::fmt;

use thiserror::Error;

use crate::args::ClassifyError;
use crate::glob::PatternError;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable process exit codes for errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Invalid arguments, file patterns or configuration.
    InvalidArguments = 2,
    /// The version control system failed or does not support the request.
    VcsError = 3,
    /// The search backend or editor could not be run.
    BackendError = 4,
    /// Bugs and unexpected state.
    InternalError = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the command line.
///
/// Messages are printed as `<prog>: <message>`, so they carry no prefix of
/// their own.
#[derive(Debug, Error)]
pub enum VcsgrepError {
    /// Bad command line that the classifier itself accepts (e.g. no search
    /// expression at all).
    #[error("{message}")]
    InvalidArguments { message: String },

    /// A file pattern failed to compile.
    #[error(transparent)]
    Pattern(PatternError),

    /// The token stream could not be classified.
    #[error(transparent)]
    Classify(ClassifyError),

    /// An environment setting has a value we do not understand.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    /// The version control tool failed or cannot do what was asked.
    #[error("{message}")]
    Vcs { message: String },

    /// Spawning or talking to grep or the editor failed.
    #[error("{program}: {message}")]
    Backend { program: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<&VcsgrepError> for ErrorCode {
    fn from(err: &VcsgrepError) -> Self {
        match err {
            VcsgrepError::InvalidArguments { .. } => ErrorCode::InvalidArguments,
            VcsgrepError::Pattern(_) => ErrorCode::InvalidArguments,
            VcsgrepError::Classify(_) => ErrorCode::InvalidArguments,
            VcsgrepError::InvalidConfig { .. } => ErrorCode::InvalidArguments,
            VcsgrepError::Vcs { .. } => ErrorCode::VcsError,
            VcsgrepError::Backend { .. } => ErrorCode::BackendError,
            VcsgrepError::Internal { .. } => ErrorCode::InternalError,
        }
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<PatternError> for VcsgrepError {
    fn from(err: PatternError) -> Self {
        VcsgrepError::Pattern(err)
    }
}

impl From<ClassifyError> for VcsgrepError {
    fn from(err: ClassifyError) -> Self {
        VcsgrepError::Classify(err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl VcsgrepError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        VcsgrepError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        VcsgrepError::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn vcs(message: impl Into<String>) -> Self {
        VcsgrepError::Vcs {
            message: message.into(),
        }
    }

    pub fn backend(program: impl Into<String>, message: impl fmt::Display) -> Self {
        VcsgrepError::Backend {
            program: program.into(),
            message: message.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        VcsgrepError::Internal {
            message: message.into(),
        }
    }

    /// Get the exit code for this error.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glob::SyntaxReason;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn pattern_error_maps_to_invalid_arguments() {
            let err = VcsgrepError::from(PatternError::Syntax {
                pattern: "foo{bar".to_string(),
                reason: SyntaxReason::UnclosedBrace,
            });
            assert_eq!(err.error_code(), ErrorCode::InvalidArguments);
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn classify_error_maps_to_invalid_arguments() {
            let err = VcsgrepError::from(ClassifyError::MissingArgument {
                flag: "-X".to_string(),
            });
            assert_eq!(err.error_code(), ErrorCode::InvalidArguments);
        }

        #[test]
        fn vcs_error_maps_to_vcs_error() {
            let err = VcsgrepError::vcs("--rev is not implemented for Git");
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn backend_error_maps_to_backend_error() {
            let err = VcsgrepError::backend("grep", "No such file or directory");
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn internal_error_maps_to_internal_error() {
            let err = VcsgrepError::internal("unexpected state");
            assert_eq!(err.error_code().code(), 10);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn pattern_error_display_is_transparent() {
            let err = VcsgrepError::from(PatternError::Syntax {
                pattern: "foo{bar}}".to_string(),
                reason: SyntaxReason::UnexpectedBrace,
            });
            assert_eq!(
                err.to_string(),
                "invalid glob pattern (unexpected \"}\"): foo{bar}}"
            );
        }

        #[test]
        fn backend_display_names_program() {
            let err = VcsgrepError::backend("gvim", "not found");
            assert_eq!(err.to_string(), "gvim: not found");
        }

        #[test]
        fn invalid_config_display() {
            let err = VcsgrepError::invalid_config("VCSGREP_VCS", "svn", "expected hg or git");
            assert_eq!(
                err.to_string(),
                "invalid value \"svn\" for VCSGREP_VCS: expected hg or git"
            );
        }
    }

    #[test]
    fn display_shows_code() {
        assert_eq!(format!("{}", ErrorCode::InvalidArguments), "2");
        assert_eq!(format!("{}", ErrorCode::InternalError), "10");
    }
}
