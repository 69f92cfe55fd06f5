use fsblob_types::{Algorithm, BlobKey};
use sha2::Digest as _;

/// Errors from the digest engine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("digest already finalized")]
    AlreadyFinalized,
}

/// A finalized digest together with the number of bytes it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    pub algorithm: Algorithm,
    pub bytes: Vec<u8>,
    pub len: u64,
}

impl Digest {
    /// Lower-case hex encoding of the digest bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Key this digest is stored under.
    pub fn to_key(&self) -> BlobKey {
        BlobKey::from_digest(self.algorithm, &self.bytes)
    }
}

enum HashState {
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl HashState {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha224 => Self::Sha224(sha2::Sha224::new()),
            Algorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            Algorithm::Sha384 => Self::Sha384(sha2::Sha384::new()),
            Algorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            Algorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha224(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha384(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

/// Incremental digest over a byte stream.
///
/// Bytes are fed with [`update`](Self::update) as they arrive; the running
/// byte count is tracked alongside the hash state. [`finalize`](Self::finalize)
/// may be called once, after which the engine rejects further input.
pub struct DigestEngine {
    algorithm: Algorithm,
    state: Option<HashState>,
    len: u64,
}

impl DigestEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            state: Some(HashState::new(algorithm)),
            len: 0,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Bytes consumed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_finalized(&self) -> bool {
        self.state.is_none()
    }

    /// Feed a chunk into the running digest.
    pub fn update(&mut self, data: &[u8]) -> Result<(), DigestError> {
        let state = self.state.as_mut().ok_or(DigestError::AlreadyFinalized)?;
        state.update(data);
        self.len += data.len() as u64;
        Ok(())
    }

    /// Finish the digest. Fails if already finalized.
    pub fn finalize(&mut self) -> Result<Digest, DigestError> {
        let state = self.state.take().ok_or(DigestError::AlreadyFinalized)?;
        Ok(Digest {
            algorithm: self.algorithm,
            bytes: state.finalize(),
            len: self.len,
        })
    }
}

impl std::fmt::Debug for DigestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestEngine")
            .field("algorithm", &self.algorithm)
            .field("len", &self.len)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

/// One-shot digest of an in-memory buffer.
pub fn hash(algorithm: Algorithm, data: &[u8]) -> Digest {
    let mut state = HashState::new(algorithm);
    state.update(data);
    Digest {
        algorithm,
        bytes: state.finalize(),
        len: data.len() as u64,
    }
}

/// Check that `data` hashes to `expected_hex` under `algorithm`.
pub fn verify(algorithm: Algorithm, data: &[u8], expected_hex: &str) -> bool {
    hash(algorithm, data).to_hex().eq_ignore_ascii_case(expected_hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HELLO_WORLD_SHA256: &str =
        "936a185caaa266bb9cbe981e9e05cb78cd732b0b3280eb944412bb6f8f8f07af";
    const HELLO_WORLD_SHA512: &str = "1594244d52f2d8c12b142bb61f47bc2eaf503d6d9ca8480cae9fcf112f66e4967dc5e8fa98285e36db8af1b8ffa8b84cb15e0fbcf836c3deb803c13f37659a60";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const EMPTY_BLAKE3: &str = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

    #[test]
    fn chunked_sha256_matches_known_digest() {
        let mut engine = DigestEngine::new(Algorithm::Sha256);
        engine.update(b"hello").unwrap();
        engine.update(b"world").unwrap();
        let digest = engine.finalize().unwrap();
        assert_eq!(digest.to_hex(), HELLO_WORLD_SHA256);
        assert_eq!(digest.len, 10);
    }

    #[test]
    fn chunked_sha512_matches_known_digest() {
        let mut engine = DigestEngine::new(Algorithm::Sha512);
        engine.update(b"hello").unwrap();
        engine.update(b"world").unwrap();
        let digest = engine.finalize().unwrap();
        assert_eq!(digest.to_hex(), HELLO_WORLD_SHA512);
        assert_eq!(
            digest.to_key().to_string(),
            format!("{HELLO_WORLD_SHA512}.sha512")
        );
    }

    #[test]
    fn empty_input_digests() {
        let digest = DigestEngine::new(Algorithm::Sha256).finalize().unwrap();
        assert_eq!(digest.to_hex(), EMPTY_SHA256);
        assert_eq!(digest.len, 0);

        let digest = DigestEngine::new(Algorithm::Blake3).finalize().unwrap();
        assert_eq!(digest.to_hex(), EMPTY_BLAKE3);
    }

    #[test]
    fn update_after_finalize_fails() {
        let mut engine = DigestEngine::new(Algorithm::Sha256);
        engine.finalize().unwrap();
        assert!(engine.is_finalized());
        assert_eq!(engine.update(b"late"), Err(DigestError::AlreadyFinalized));
        assert_eq!(engine.finalize(), Err(DigestError::AlreadyFinalized));
    }

    #[test]
    fn digest_lengths_match_algorithm() {
        for algo in Algorithm::ALL {
            let digest = hash(algo, b"x");
            assert_eq!(digest.bytes.len(), algo.digest_len(), "{algo}");
        }
    }

    #[test]
    fn different_algorithms_produce_different_keys() {
        let a = hash(Algorithm::Sha256, b"same").to_key();
        let b = hash(Algorithm::Blake3, b"same").to_key();
        assert_eq!(a.digest_hex().len(), b.digest_hex().len());
        assert_ne!(a, b);
    }

    #[test]
    fn verify_correct_and_tampered() {
        assert!(verify(Algorithm::Sha256, b"helloworld", HELLO_WORLD_SHA256));
        assert!(!verify(Algorithm::Sha256, b"hellow0rld", HELLO_WORLD_SHA256));
    }

    #[test]
    fn len_tracks_updates() {
        let mut engine = DigestEngine::new(Algorithm::Sha384);
        assert!(engine.is_empty());
        engine.update(&[0u8; 100]).unwrap();
        engine.update(&[]).unwrap();
        assert_eq!(engine.len(), 100);
    }

    proptest! {
        #[test]
        fn streaming_equals_one_shot(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            split in 0usize..2048,
        ) {
            let split = split.min(data.len());
            for algo in Algorithm::ALL {
                let mut engine = DigestEngine::new(algo);
                engine.update(&data[..split]).unwrap();
                engine.update(&data[split..]).unwrap();
                prop_assert_eq!(engine.finalize().unwrap(), hash(algo, &data));
            }
        }
    }
}
