//! Filesystem-backed content-addressable blob store.
//!
//! Callers stream bytes into a [`BlobWriter`]; the digest is computed while
//! the bytes are persisted to a private temporary file, and on
//! [`finish`](BlobWriter::finish) the file is renamed to a path derived from
//! its key. Keys are `<lowercase-hex-digest>.<algorithm>`.
//!
//! # Operations
//!
//! All operations live on the [`BlobStore`] trait, implemented by
//! [`FsBlobStore`]:
//!
//! - `create_write`: start a write; `append`/`finish` on the handle
//! - `create_read`: lazy [`BlobStream`], optionally over `[start, end)`
//! - `resolve` / `exists`: locate a blob without opening it
//! - `remove`: delete a blob, reporting whether anything was deleted
//!
//! # Design Rules
//!
//! 1. A blob is either completely present under its key or absent.
//! 2. Write-then-link: persist to `.tmp`, then one atomic rename.
//! 3. No in-process locking; the rename is the only shared invariant.
//! 4. The store never interprets blob contents.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! ```rust,no_run
//! use fsblob_store::{BlobStore, FsBlobStore, ReadSelector};
//!
//! # async fn demo() -> fsblob_store::StoreResult<()> {
//! let store = FsBlobStore::open("/var/lib/fsblob");
//! let mut w = store.create_write().await?;
//! w.append(b"hello").await?;
//! w.append(b"world").await?;
//! let meta = w.finish().await?;
//!
//! let tail = store
//!     .create_read(ReadSelector::new(&w).start(5))
//!     .read_to_end()
//!     .await?;
//! assert_eq!(tail, b"world");
//! assert!(store.remove(meta.key.to_string().as_str().into()).await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod layout;
pub mod reader;
pub mod target;
pub mod traits;
pub mod writer;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use fs::{BlobStat, FsBlobStore, ResolvedBlob};
pub use fsblob_types::{Algorithm, BlobKey, BlobMetadata};
pub use reader::BlobStream;
pub use target::{BlobRef, ReadSelector};
pub use traits::BlobStore;
pub use writer::BlobWriter;
