//! Classified errors and their process exit codes.
//!
//! Every fatal condition the CLI can hit maps onto one [`Error`] variant,
//! and every variant maps onto exactly one exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `0` | success |
//! | `1` | invalid arguments or usage |
//! | `2` | input-side error (input file, network fetch) |
//! | `3` | output-side error, or the index text could not be parsed |
//! | `4` | processing error (nothing was downloaded) |
//!
//! Per-link download failures are *not* errors; they are recorded as
//! outcomes in the [`FetchReport`](crate::models::FetchReport).

use std::path::PathBuf;

/// Exit code for a successful run.
pub const EXIT_OK: i32 = 0;
/// Exit code for invalid arguments and usage errors.
pub const EXIT_USAGE: i32 = 1;
/// Exit code for input-side failures.
pub const EXIT_INPUT: i32 = 2;
/// Exit code for output-side failures and unparseable index text.
pub const EXIT_OUTPUT: i32 = 3;
/// Exit code when a download run produced nothing.
pub const EXIT_PROCESSING: i32 = 4;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad CLI usage or a malformed URL. Raised before any I/O.
    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The input file is missing, unreadable, or not a valid index JSON.
    #[error("{}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// The response arrived but is not an index document.
    #[error("{0}")]
    Parse(String),

    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run completed but produced nothing useful.
    #[error("{0}")]
    Processing(String),
}

/// Request-level failures, kept apart so callers can tell a transient
/// timeout from a hard HTTP error.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("request to {url} failed: HTTP {code} {text}")]
    HttpStatus { url: String, code: u16, text: String },

    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => EXIT_USAGE,
            Error::Network(_) | Error::InvalidInput { .. } => EXIT_INPUT,
            Error::Parse(_) | Error::Filesystem { .. } => EXIT_OUTPUT,
            Error::Processing(_) => EXIT_PROCESSING,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_input(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::InvalidInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl NetworkError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetworkError::Timeout { .. })
    }
}
