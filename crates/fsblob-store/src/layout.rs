//! On-disk layout beneath a store root.
//!
//! ```text
//! <root>/
//!   .tmp/<uuid>.part          in-flight writes
//!   <hex[0..2]>/<key>         published blobs
//! ```
//!
//! Callers must not rely on this layout; only the path returned by
//! `resolve` is meaningful outside the crate.

use std::path::{Path, PathBuf};

use fsblob_types::BlobKey;
use uuid::Uuid;

/// Directory for unpublished writes. Never a valid shard name.
pub const TEMP_DIR: &str = ".tmp";

/// Final location of a blob.
pub fn locate(root: &Path, key: &BlobKey) -> PathBuf {
    root.join(key.shard()).join(key.to_string())
}

pub(crate) fn temp_dir(root: &Path) -> PathBuf {
    root.join(TEMP_DIR)
}

/// Fresh, private temporary file name.
pub(crate) fn temp_path(root: &Path) -> PathBuf {
    temp_dir(root).join(format!("{}.part", Uuid::now_v7()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_shards_by_leading_hex() {
        let key = BlobKey::encode("sha256", &[0xab; 32]);
        let path = locate(Path::new("/store"), &key);
        assert_eq!(path, Path::new("/store/ab").join(key.to_string()));
    }

    #[test]
    fn temp_paths_are_unique_and_private() {
        let a = temp_path(Path::new("/store"));
        let b = temp_path(Path::new("/store"));
        assert_ne!(a, b);
        assert!(a.starts_with("/store/.tmp"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("part"));
    }
}
