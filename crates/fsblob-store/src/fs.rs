use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fsblob_crypto::DigestEngine;
use fsblob_types::{Algorithm, BlobKey, KeyError};
use serde::Serialize;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::layout;
use crate::reader::{self, BlobStream};
use crate::target::{BlobRef, ReadSelector};
use crate::traits::BlobStore;
use crate::writer::BlobWriter;

/// Filesystem metadata of a stored blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlobStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl From<&std::fs::Metadata> for BlobStat {
    fn from(meta: &std::fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

/// Positive result of [`BlobStore::resolve`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedBlob {
    pub path: PathBuf,
    pub stat: BlobStat,
}

/// Content-addressable store rooted at a local directory.
///
/// The store holds only its configuration; every blob lives in the
/// filesystem and the directory tree is the index. Cloning is cheap and
/// clones share the same configuration. Construction does no I/O: the root
/// is created on first write.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    config: Arc<StoreConfig>,
}

impl FsBlobStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Store at `root` with the default algorithm.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(root))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    /// Path a blob with this key lives at.
    pub fn locate(&self, key: &BlobKey) -> PathBuf {
        layout::locate(&self.config.root, key)
    }

    async fn resolve_key(&self, key: &BlobKey) -> StoreResult<Option<ResolvedBlob>> {
        let path = self.locate(key);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(ResolvedBlob {
                stat: BlobStat::from(&meta),
                path,
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-hash a stored blob and check it still matches its key.
    ///
    /// Returns `Ok(false)` for a blob whose bytes were altered on disk.
    pub async fn verify(&self, target: BlobRef<'_>) -> StoreResult<bool> {
        let label = target.describe();
        let key = target
            .to_key()?
            .ok_or_else(|| StoreError::NotFound(label.clone()))?;
        let algorithm = key
            .algorithm()
            .ok_or_else(|| KeyError::UnknownAlgorithm(key.algorithm_name().to_string()))?;

        let mut file = open_blob(&self.locate(&key), &label).await?;
        let mut engine = DigestEngine::new(algorithm);
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            engine.update(&buf[..n])?;
        }

        let digest = engine.finalize()?;
        let intact = digest.bytes == key.digest_bytes();
        if !intact {
            warn!(key = %key, actual = %digest.to_hex(), "blob content does not match its key");
        }
        Ok(intact)
    }
}

async fn open_blob(path: &Path, label: &str) -> StoreResult<File> {
    match File::open(path).await {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(label.to_string())),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn create_write(&self) -> StoreResult<BlobWriter> {
        BlobWriter::create(Arc::clone(&self.config)).await
    }

    fn create_read(&self, selector: ReadSelector<'_>) -> BlobStream {
        let store = self.clone();
        let key = selector.target.to_key();
        let label = selector.target.describe();
        let (start, end) = (selector.start, selector.end);

        BlobStream::lazy(async move {
            let key = key?.ok_or_else(|| StoreError::NotFound(label.clone()))?;
            let resolved = store
                .resolve_key(&key)
                .await?
                .ok_or_else(|| StoreError::NotFound(label.clone()))?;
            // the blob may be removed between resolve and open
            let file = open_blob(&resolved.path, &label).await?;
            let len = file.metadata().await?.len();
            reader::slice(file, len, start, end).await
        })
    }

    async fn resolve(&self, target: BlobRef<'_>) -> StoreResult<Option<ResolvedBlob>> {
        match target.to_key()? {
            Some(key) => self.resolve_key(&key).await,
            None => Ok(None),
        }
    }

    async fn remove(&self, target: BlobRef<'_>) -> StoreResult<bool> {
        let Some(key) = target.to_key()? else {
            return Ok(false);
        };
        match fs::remove_file(self.locate(&key)).await {
            Ok(()) => {
                debug!(key = %key, "blob removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
