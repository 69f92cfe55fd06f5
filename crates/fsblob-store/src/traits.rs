use async_trait::async_trait;

use crate::error::StoreResult;
use crate::fs::ResolvedBlob;
use crate::reader::BlobStream;
use crate::target::{BlobRef, ReadSelector};
use crate::writer::BlobWriter;

/// Content-addressable blob store.
///
/// All implementations must satisfy these invariants:
/// - Keys are derived from content; identical content under the same
///   algorithm always lands on the same key.
/// - Write-then-link: a blob becomes visible under its key only once it is
///   completely persisted.
/// - Negative outcomes are values, not errors: `resolve` yields `None` and
///   `remove` yields `false` for keys with nothing behind them, including
///   malformed keys.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Start a new write. The returned handle is open until finished.
    async fn create_write(&self) -> StoreResult<BlobWriter>;

    /// Open a lazy byte stream over a blob or a sub-range of it.
    ///
    /// Resolution failures are reported through the stream, not here.
    fn create_read(&self, selector: ReadSelector<'_>) -> BlobStream;

    /// Locate a blob without opening it.
    async fn resolve(&self, target: BlobRef<'_>) -> StoreResult<Option<ResolvedBlob>>;

    /// Check whether a blob exists.
    async fn exists(&self, target: BlobRef<'_>) -> StoreResult<bool> {
        Ok(self.resolve(target).await?.is_some())
    }

    /// Delete a blob. Returns `true` if a blob was actually removed.
    async fn remove(&self, target: BlobRef<'_>) -> StoreResult<bool>;
}
