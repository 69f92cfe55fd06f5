use serde::{Deserialize, Serialize};

use crate::key::BlobKey;

/// Record produced exactly once per successful write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Content-derived key the blob was published under.
    pub key: BlobKey,
    /// Number of bytes written.
    pub size: u64,
}
