//! Foundation types for fsblob.
//!
//! Every other fsblob crate depends on `fsblob-types`. It owns the on-disk
//! naming contract of the store: which digest algorithms exist, how a
//! finalized digest becomes a key string, and how a key string is parsed
//! back into its parts.
//!
//! # Key Types
//!
//! - [`Algorithm`]: Digest algorithm identifier (`sha256` by default)
//! - [`BlobKey`]: Content-derived key, `<lowercase-hex-digest>.<algorithm>`
//! - [`BlobMetadata`]: `{ key, size }` record produced by a completed write

pub mod algorithm;
pub mod error;
pub mod key;
pub mod metadata;

pub use algorithm::Algorithm;
pub use error::KeyError;
pub use key::BlobKey;
pub use metadata::BlobMetadata;
