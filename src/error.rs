//! Error taxonomy for one generation pass.
//!
//! All failures surface synchronously from [`crate::assemble::generate`];
//! callers see exactly two outcomes: both artifacts written, or one of these.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// The interface model is internally inconsistent: an unresolved enum
    /// subset reference, a duplicate enum/struct name, or a duplicate
    /// (function-id, message-kind) identity. Raised before any write.
    #[error("semantic error at {location}: {message}")]
    Semantic { location: String, message: String },

    /// Destination directory missing, or an artifact write failed. The
    /// artifact must not be treated as valid; no cleanup is attempted.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fixed emission contract was invoked with input it does not cover,
    /// e.g. an unrecognized message kind handed to the params-fill emitter.
    /// Rejected explicitly, never treated as empty output.
    #[error("contract violation: {what}")]
    Contract { what: String },
}

impl GenError {
    pub fn semantic(location: impl Into<String>, message: impl Into<String>) -> Self {
        GenError::Semantic {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn contract(what: impl Into<String>) -> Self {
        GenError::Contract { what: what.into() }
    }
}
