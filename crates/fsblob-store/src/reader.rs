use std::future::Future;
use std::io::SeekFrom;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use crate::error::{StoreError, StoreResult};

const CHUNK_SIZE: usize = 64 * 1024;

/// Lazy stream of a blob's bytes.
///
/// Nothing touches the filesystem until the first poll; a missing blob shows
/// up as a single `Err(StoreError::NotFound)` item. The stream is finite and
/// not restartable. Dropping it early closes the underlying file.
pub struct BlobStream {
    inner: Pin<Box<dyn Stream<Item = StoreResult<Bytes>> + Send>>,
}

impl BlobStream {
    /// Stream the reader produced by `open`.
    pub(crate) fn lazy<F>(open: F) -> Self
    where
        F: Future<Output = StoreResult<Take<File>>> + Send + 'static,
    {
        let inner = stream::once(open)
            .map(|opened| match opened {
                Ok(reader) => ReaderStream::with_capacity(reader, CHUNK_SIZE)
                    .map_err(StoreError::from)
                    .left_stream(),
                Err(e) => stream::iter([Err(e)]).right_stream(),
            })
            .flatten();
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Collect the remaining bytes.
    pub async fn read_to_end(mut self) -> StoreResult<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl Stream for BlobStream {
    type Item = StoreResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for BlobStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStream").finish_non_exhaustive()
    }
}

/// Seek `file` to `start` and limit it to `end` (exclusive, clamped to the
/// file length). An empty or inverted range reads nothing.
pub(crate) async fn slice(
    mut file: File,
    len: u64,
    start: Option<u64>,
    end: Option<u64>,
) -> StoreResult<Take<File>> {
    let start = start.unwrap_or(0).min(len);
    let end = end.map_or(len, |e| e.min(len)).max(start);
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    Ok(file.take(end - start))
}
