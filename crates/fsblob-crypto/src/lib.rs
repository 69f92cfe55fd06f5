//! Streaming digest engine for fsblob.
//!
//! Wraps the SHA-2 family (`sha2`) and BLAKE3 (`blake3`) behind a single
//! incremental [`DigestEngine`] that also counts the bytes it has seen.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod engine;

pub use engine::{hash, verify, Digest, DigestEngine, DigestError};
