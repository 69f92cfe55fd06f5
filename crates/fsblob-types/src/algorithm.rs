use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Digest algorithm used to derive blob keys.
///
/// The algorithm's [`name`](Algorithm::name) is the suffix of every key the
/// store produces, so stores configured with different algorithms never
/// collide and each key says how it was computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl Algorithm {
    /// Every algorithm this build can compute.
    pub const ALL: [Algorithm; 5] = [
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Blake3,
    ];

    /// Name used as the key suffix.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of a finalized digest in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
            Self::Blake3 => 32,
        }
    }

    /// Look up an algorithm by its key suffix.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| KeyError::UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sha256() {
        assert_eq!(Algorithm::default(), Algorithm::Sha256);
    }

    #[test]
    fn name_roundtrip() {
        for algo in Algorithm::ALL {
            assert_eq!(algo.name().parse::<Algorithm>().unwrap(), algo);
        }
    }

    #[test]
    fn unknown_name_rejected() {
        let err = "md5".parse::<Algorithm>().unwrap_err();
        assert_eq!(err, KeyError::UnknownAlgorithm("md5".into()));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(Algorithm::from_name("SHA256").is_none());
    }

    #[test]
    fn serde_uses_key_suffix() {
        let json = serde_json::to_string(&Algorithm::Sha512).unwrap();
        assert_eq!(json, "\"sha512\"");
        let parsed: Algorithm = serde_json::from_str("\"blake3\"").unwrap();
        assert_eq!(parsed, Algorithm::Blake3);
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(format!("{}", Algorithm::Sha384), "sha384");
    }
}
