use fsblob_crypto::DigestError;
use fsblob_types::KeyError;

/// Errors from blob store operations.
///
/// Negative lookups are not errors: `resolve` returns `Ok(None)` and
/// `remove` returns `Ok(false)`. Only a read stream reports a missing blob
/// as [`StoreError::NotFound`], since it has to yield something.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No blob exists for the requested key.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The key string is malformed or names an algorithm this build lacks.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Operation attempted on a write handle in the wrong state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Store configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DigestError> for StoreError {
    fn from(err: DigestError) -> Self {
        match err {
            DigestError::AlreadyFinalized => Self::InvalidState("digest already finalized"),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
