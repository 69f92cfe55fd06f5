use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fsblob_crypto::DigestEngine;
use fsblob_types::{Algorithm, BlobKey, BlobMetadata};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::layout;

/// Handle for one in-progress blob write.
///
/// Bytes go to a private file under `<root>/.tmp` while the digest is
/// computed alongside. [`finish`](Self::finish) derives the key and renames
/// the file into place in a single step, so nothing is ever visible under a
/// key before it is complete. Appends take `&mut self`, which keeps them
/// ordered on one handle.
///
/// Once finished the handle is read-only and can be passed wherever a key is
/// expected (see [`BlobRef::Handle`](crate::BlobRef::Handle)). A handle that
/// is dropped without finishing or aborting leaves its temporary file behind.
pub struct BlobWriter {
    config: Arc<StoreConfig>,
    state: WriteState,
}

enum WriteState {
    Open(OpenWrite),
    Finished(BlobMetadata),
    /// Aborted, or failed mid-write.
    Closed,
}

struct OpenWrite {
    file: BufWriter<File>,
    temp_path: PathBuf,
    digest: DigestEngine,
}

impl OpenWrite {
    async fn append(&mut self, chunk: &[u8]) -> StoreResult<()> {
        self.file.write_all(chunk).await?;
        self.digest.update(chunk)?;
        Ok(())
    }
}

impl BlobWriter {
    pub(crate) async fn create(config: Arc<StoreConfig>) -> StoreResult<Self> {
        fs::create_dir_all(layout::temp_dir(&config.root)).await?;
        let temp_path = layout::temp_path(&config.root);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await?;

        debug!(temp = %temp_path.display(), algorithm = %config.algorithm, "blob write started");

        let digest = DigestEngine::new(config.algorithm);
        Ok(Self {
            config,
            state: WriteState::Open(OpenWrite {
                file: BufWriter::new(file),
                temp_path,
                digest,
            }),
        })
    }

    /// Append a chunk. On I/O failure the write is discarded and every
    /// later call reports [`StoreError::InvalidState`].
    pub async fn append(&mut self, chunk: &[u8]) -> StoreResult<()> {
        let result = match &mut self.state {
            WriteState::Open(open) => open.append(chunk).await,
            _ => return Err(self.not_open()),
        };
        if result.is_err() {
            self.discard().await;
        }
        result
    }

    /// Stream everything from `reader` into the blob. Returns bytes copied.
    pub async fn copy_from<R>(&mut self, reader: &mut R) -> StoreResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if !matches!(self.state, WriteState::Open(_)) {
            return Err(self.not_open());
        }
        match tokio::io::copy(reader, &mut *self).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.discard().await;
                Err(e.into())
            }
        }
    }

    /// Complete the write and publish the blob under its content key.
    ///
    /// Publishing content that is already stored is a no-op: the new
    /// temporary file is dropped and the existing blob is kept.
    pub async fn finish(&mut self) -> StoreResult<BlobMetadata> {
        let open = match mem::replace(&mut self.state, WriteState::Closed) {
            WriteState::Open(open) => open,
            other => {
                self.state = other;
                return Err(self.not_open());
            }
        };

        let temp_path = open.temp_path.clone();
        match self.publish(open).await {
            Ok(meta) => {
                self.state = WriteState::Finished(meta.clone());
                Ok(meta)
            }
            Err(e) => {
                remove_temp(&temp_path).await;
                Err(e)
            }
        }
    }

    /// Discard an unfinished write and its temporary file.
    pub async fn abort(&mut self) -> StoreResult<()> {
        match mem::replace(&mut self.state, WriteState::Closed) {
            WriteState::Open(open) => {
                drop(open.file);
                fs::remove_file(&open.temp_path).await?;
                debug!(temp = %open.temp_path.display(), "blob write aborted");
                Ok(())
            }
            WriteState::Finished(meta) => {
                self.state = WriteState::Finished(meta);
                Err(StoreError::InvalidState("blob write already finished"))
            }
            WriteState::Closed => Ok(()),
        }
    }

    async fn publish(&self, open: OpenWrite) -> StoreResult<BlobMetadata> {
        let OpenWrite {
            mut file,
            temp_path,
            mut digest,
        } = open;

        file.flush().await?;
        let file = file.into_inner();
        if self.config.fsync {
            file.sync_all().await?;
        }
        drop(file);

        let digest = digest.finalize()?;
        let key = digest.to_key();
        let dest = layout::locate(&self.config.root, &key);
        if let Some(shard) = dest.parent() {
            fs::create_dir_all(shard).await?;
        }

        let deduplicated = fs::try_exists(&dest).await?;
        if deduplicated {
            remove_temp(&temp_path).await;
        } else {
            // rename(2) replaces atomically, so a racing writer of the same
            // content still leaves one complete file at `dest`.
            fs::rename(&temp_path, &dest).await?;
        }

        debug!(key = %key, size = digest.len, deduplicated, "blob published");
        Ok(BlobMetadata {
            key,
            size: digest.len,
        })
    }

    async fn discard(&mut self) {
        if let WriteState::Open(open) = mem::replace(&mut self.state, WriteState::Closed) {
            drop(open.file);
            remove_temp(&open.temp_path).await;
        }
    }

    fn not_open(&self) -> StoreError {
        match self.state {
            WriteState::Finished(_) => StoreError::InvalidState("blob write already finished"),
            _ => StoreError::InvalidState("blob write was aborted or failed"),
        }
    }

    /// Algorithm this write is hashed with.
    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    /// Key of the published blob, once finished.
    pub fn key(&self) -> Option<&BlobKey> {
        self.metadata().map(|m| &m.key)
    }

    /// Metadata record, once finished.
    pub fn metadata(&self) -> Option<&BlobMetadata> {
        match &self.state {
            WriteState::Finished(meta) => Some(meta),
            _ => None,
        }
    }

    /// Bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        match &self.state {
            WriteState::Open(open) => open.digest.len(),
            WriteState::Finished(meta) => meta.size,
            WriteState::Closed => 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, WriteState::Finished(_))
    }

    /// Temporary file backing an open write.
    pub fn temp_path(&self) -> Option<&Path> {
        match &self.state {
            WriteState::Open(open) => Some(&open.temp_path),
            _ => None,
        }
    }
}

async fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(temp = %path.display(), error = %e, "failed to remove temporary blob file");
        }
    }
}

impl AsyncWrite for BlobWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let WriteState::Open(open) = &mut self.get_mut().state else {
            return Poll::Ready(Err(io::Error::other("blob write is not open")));
        };
        match Pin::new(&mut open.file).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => match open.digest.update(&buf[..n]) {
                Ok(()) => Poll::Ready(Ok(n)),
                Err(e) => Poll::Ready(Err(io::Error::other(e))),
            },
            other => other,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().state {
            WriteState::Open(open) => Pin::new(&mut open.file).poll_flush(cx),
            _ => Poll::Ready(Ok(())),
        }
    }

    /// Flushes only; the blob is published by [`BlobWriter::finish`].
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}

impl std::fmt::Debug for BlobWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            WriteState::Open(_) => "open",
            WriteState::Finished(_) => "finished",
            WriteState::Closed => "closed",
        };
        f.debug_struct("BlobWriter")
            .field("algorithm", &self.config.algorithm)
            .field("state", &state)
            .field("bytes_written", &self.bytes_written())
            .field("key", &self.key())
            .finish()
    }
}
