//! Error type shared by every stage of inference.
//!
//! All variants are fatal: a mismatch means a corrupt checkpoint or a
//! caller configuration error, and nothing inside the crate retries.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure, with the path that caused it.
    #[error("cannot {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip container failure while reading or writing a checkpoint.
    #[error("archive error in '{}': {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A declared count or index disagrees with what the sampler expects.
    #[error("{what} mismatch: expected {expected}, found {found}")]
    Mismatch {
        what: String,
        expected: String,
        found: String,
    },

    /// A segment line that cannot be parsed at all.
    #[error("malformed {segment} segment at line {line}: {message}")]
    Malformed {
        segment: &'static str,
        line: usize,
        message: String,
    },

    #[error("archive has no {segment} segment")]
    MissingSegment { segment: &'static str },

    /// Any decode failure, tagged with the checkpoint it came from.
    #[error("checkpoint '{}': {source}", path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid corpus: {0}")]
    Corpus(String),

    /// A draw or update met weights it cannot use (none positive, NaN).
    #[error("numeric failure: {0}")]
    Numeric(String),

    /// An internal invariant was broken (counts, profiles, assignments).
    #[error("consistency check failed ({context}): {message}")]
    Consistency { context: String, message: String },

    /// An operation was called in a lifecycle phase that does not allow it.
    #[error("cannot {operation} while the sampler is {phase}")]
    Phase {
        operation: &'static str,
        phase: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn mismatch(what: impl Into<String>, expected: impl ToString, found: impl ToString) -> Self {
        Error::Mismatch {
            what: what.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn consistency(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Consistency {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Attach a checkpoint path to a decode error.
    pub fn in_checkpoint(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // I/O and archive errors already carry their path.
            e @ (Error::Io { .. } | Error::Archive { .. } | Error::Checkpoint { .. }) => e,
            e => Error::Checkpoint {
                path: path.into(),
                source: Box::new(e),
            },
        }
    }
}
