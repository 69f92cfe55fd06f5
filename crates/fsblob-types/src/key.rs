use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::algorithm::Algorithm;
use crate::error::KeyError;

/// Content-derived identifier of a persisted blob.
///
/// The canonical string form is `<lowercase-hex-digest>.<algorithm>`, for
/// example `936a18...f07af.sha256`. Keys are never chosen by callers: a key
/// is either encoded from a finalized digest or parsed from a string that
/// was produced that way.
///
/// The algorithm part is kept as a name rather than an [`Algorithm`] so
/// keys written by a build with more algorithms still parse; for names this
/// build knows, the digest length is checked.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey {
    digest_hex: String,
    algorithm: String,
}

impl BlobKey {
    /// Encode a finalized digest under the given algorithm name.
    pub fn encode(algorithm: &str, digest: &[u8]) -> Self {
        Self {
            digest_hex: hex::encode(digest),
            algorithm: algorithm.to_string(),
        }
    }

    /// Encode a digest produced by a known algorithm.
    pub fn from_digest(algorithm: Algorithm, digest: &[u8]) -> Self {
        Self::encode(algorithm.name(), digest)
    }

    /// Parse a key string, splitting on the last `.`.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let (hex_part, algorithm) = key
            .rsplit_once('.')
            .ok_or_else(|| KeyError::MissingSeparator(key.to_string()))?;

        if algorithm.is_empty()
            || !algorithm
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(KeyError::InvalidAlgorithm(algorithm.to_string()));
        }

        if hex_part.is_empty() {
            return Err(KeyError::InvalidHex("empty digest".into()));
        }
        let bytes = hex::decode(hex_part).map_err(|e| KeyError::InvalidHex(e.to_string()))?;

        if let Some(known) = Algorithm::from_name(algorithm) {
            if bytes.len() != known.digest_len() {
                return Err(KeyError::DigestLength {
                    algorithm: algorithm.to_string(),
                    expected: known.digest_len(),
                    actual: bytes.len(),
                });
            }
        }

        Ok(Self {
            digest_hex: hex_part.to_ascii_lowercase(),
            algorithm: algorithm.to_string(),
        })
    }

    /// Lower-case hex digest.
    pub fn digest_hex(&self) -> &str {
        &self.digest_hex
    }

    /// Raw digest bytes.
    pub fn digest_bytes(&self) -> Vec<u8> {
        // digest_hex is validated hex on every construction path
        hex::decode(&self.digest_hex).unwrap_or_default()
    }

    /// Algorithm name as it appears in the key.
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm
    }

    /// The algorithm, if this build knows it.
    pub fn algorithm(&self) -> Option<Algorithm> {
        Algorithm::from_name(&self.algorithm)
    }

    /// Leading two hex characters, used to shard the on-disk layout.
    pub fn shard(&self) -> &str {
        &self.digest_hex[..2.min(self.digest_hex.len())]
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.digest_hex, self.algorithm)
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.digest_hex[..8.min(self.digest_hex.len())];
        write!(f, "BlobKey({short}.{})", self.algorithm)
    }
}

impl FromStr for BlobKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BlobKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlobKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
