use std::path::PathBuf;
use thiserror::Error;

/// Error kinds produced by the index build, classification, and reporting paths.
///
/// `InputMissing`, `InputMalformed`, `ConfigInvalid`, and `ResourceExhausted` are fatal:
/// callers should treat them as process-ending errors. `OutputFailure` is fatal to the
/// operation that produced it but does not imply the index itself is invalid.
///
/// `AmbiguousWindow` and `LookupMiss` are intentionally absent here: both are recovered
/// locally (the offending k-mer window is skipped) and never surface as an `IndexError`.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("required file missing or unreadable: {path:?}")]
    InputMissing { path: PathBuf },

    #[error("malformed input in {path:?} at line {line}: {reason}")]
    InputMalformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    #[error("resource exhausted while building the k-mer table: {reason}")]
    ResourceExhausted { reason: String },

    #[error("failed to write output to {path:?}: {source}")]
    OutputFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IndexError>;
