//! The failure taxonomy shared across the crate.  Every fallible operation
//! reports one of these kinds; the top-level entry point translates them into
//! process exit codes and one-line diagnostics.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot parse manifest: {0}")]
    ManifestParse(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    PatternParse { pattern: String, message: String },

    #[error("rule #{rule_ix} consumes rule #{input_ix}, which is not declared earlier")]
    RuleOrder { rule_ix: usize, input_ix: usize },

    #[error("two rules produce the same output `{path}`")]
    OutputCollision { path: String },

    #[error("unknown target `{path}`")]
    UnknownTarget { path: String },

    #[error("path `{path}` is outside the project root")]
    PathOutsideRoot { path: String },

    #[error("cannot parse depfile: {0}")]
    DepfileParse(String),

    #[error("update log `{}` is corrupted; delete or revert it, then retry", .path.display())]
    LogCorruption { path: PathBuf },

    #[error("command `{binary}` failed: {status}")]
    ProcessFailure { binary: String, status: String },

    #[error("{}: {source}", .path.display())]
    IoFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot find Updfile in the current directory or in any of the parent directories")]
    RootNotFound,

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl Error {
    /// Wrap an I/O error with the path it concerns, for use with `map_err`.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::IoFailure { path, source }
    }

    /// True for I/O failures caused by a file that does not exist.  The
    /// freshness check treats those as "stale", not as fatal errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::IoFailure { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Every taxonomy kind is an environment or runtime failure; argument
    /// errors exit with code 1 before any of these can be constructed.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
