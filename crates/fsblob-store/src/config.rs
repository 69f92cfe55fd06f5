use std::path::{Path, PathBuf};

use fsblob_types::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Immutable configuration of one store instance.
///
/// ```toml
/// root = "/var/lib/fsblob"
/// algorithm = "sha256"
/// fsync = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory holding every blob of this store.
    pub root: PathBuf,
    /// Digest algorithm used for all keys this store produces.
    #[serde(default)]
    pub algorithm: Algorithm,
    /// `fsync` each blob before it is published.
    #[serde(default = "default_fsync")]
    pub fsync: bool,
}

fn default_fsync() -> bool {
    true
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            algorithm: Algorithm::default(),
            fsync: default_fsync(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    pub async fn load(path: &Path) -> StoreResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
