use thiserror::Error;

/// Errors produced while parsing keys and algorithm names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key has no algorithm separator: {0}")]
    MissingSeparator(String),

    #[error("invalid hex digest: {0}")]
    InvalidHex(String),

    #[error("invalid algorithm name: {0:?}")]
    InvalidAlgorithm(String),

    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid {algorithm} digest length: expected {expected} bytes, got {actual}")]
    DigestLength {
        algorithm: String,
        expected: usize,
        actual: usize,
    },
}
