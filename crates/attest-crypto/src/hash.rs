// Hashing functions and types
//
// BLAKE3 is used for content addressing and commitments, SHA-256 for
// transport transcript digests (the format external proof producers emit).

use std::fmt;

use sha2::{Digest, Sha256};

use crate::macros::impl_hex_serde;
use crate::{CryptoError, CryptoResult};

/// Output of a 32-byte hash function
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashOutput([u8; 32]);

impl HashOutput {
    /// The all-zero hash, used to pad commitment trees
    pub const ZERO: HashOutput = HashOutput([0u8; 32]);

    /// Create a new hash output from raw bytes
    pub fn new(data: [u8; 32]) -> Self {
        Self(data)
    }

    /// Get the raw bytes of the hash
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create a hash output from a byte slice of exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let data: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(data))
    }

    /// Convert the hash output to a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create a hash output from a hex string
    pub fn from_hex(hex_str: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(hex_str).map_err(|e| CryptoError::encoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for HashOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashOutput({})", self.to_hex())
    }
}

impl fmt::Display for HashOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for HashOutput {
    fn from(data: [u8; 32]) -> Self {
        Self(data)
    }
}

impl_hex_serde!(HashOutput);

/// Compute the BLAKE3 content hash of arbitrary bytes.
#[inline]
pub fn content_hash(data: &[u8]) -> HashOutput {
    HashOutput(*blake3::hash(data).as_bytes())
}

/// Compute a domain-separated BLAKE3 hash over a sequence of parts.
///
/// The domain tag is terminated by a zero byte; callers must only pass a
/// variable-length part in the last position.
pub fn domain_hash(domain: &str, parts: &[&[u8]]) -> HashOutput {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain.as_bytes());
    hasher.update(&[0u8]);
    for part in parts {
        hasher.update(part);
    }
    HashOutput(*hasher.finalize().as_bytes())
}

/// Compute the SHA-256 digest of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
