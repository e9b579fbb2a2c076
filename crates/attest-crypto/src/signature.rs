// Digital signature creation and verification
//
// All signing in the protocol is Ed25519 over 32-byte commitments.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::macros::impl_hex_serde;
use crate::{CryptoError, CryptoResult};

/// An Ed25519 public key identifying a signer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wrap raw key bytes without validating the curve point
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create a key from a byte slice of exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let data: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(data))
    }

    /// Parse a key from its hex form
    pub fn from_hex(hex_str: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(hex_str).map_err(|e| CryptoError::encoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Hex form of the key
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }

    /// Deserialize into an Ed25519 verifying key.
    ///
    /// Fails if the 32 bytes are not a valid curve point.
    pub fn verifying_key(&self) -> CryptoResult<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|_| CryptoError::InvalidPublicKey(self.to_hex()))
    }

    /// Verify a signature over `message` made by this key.
    ///
    /// Uses `verify_strict()` (rejects small-order keys, checks canonical S).
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        let vk = self.verifying_key()?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        vk.verify_strict(message, &sig)
            .map_err(|_| CryptoError::signature(format!("signature does not verify for key {}", self.short())))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.short())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl_hex_serde!(PublicKey);

/// A 64-byte Ed25519 signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Wrap raw signature bytes
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw signature bytes
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Create a signature from a byte slice of exactly 64 bytes
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let data: [u8; 64] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: 64,
            actual: bytes.len(),
        })?;
        Ok(Self(data))
    }

    /// Convert the signature to a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

impl_hex_serde!(Signature);

/// An Ed25519 keypair held by a protocol participant.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new keypair from the OS random source
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derive a keypair from a 32-byte secret seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Public half of the keypair
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keys = KeyPair::generate();
        let signature = keys.sign(b"commitment");
        assert!(keys.public_key().verify(b"commitment", &signature).is_ok());
        assert!(keys.public_key().verify(b"other", &signature).is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let alice = KeyPair::from_seed([1u8; 32]);
        let bob = KeyPair::from_seed([2u8; 32]);
        let signature = alice.sign(b"commitment");
        assert!(matches!(
            bob.public_key().verify(b"commitment", &signature),
            Err(CryptoError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_seeded_keys_are_stable() {
        let a = KeyPair::from_seed([7u8; 32]);
        let b = KeyPair::from_seed([7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.sign(b"m"), b.sign(b"m"));
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let key = KeyPair::generate().public_key();
        assert_eq!(PublicKey::from_hex(&key.to_hex()).unwrap(), key);

        let json = serde_json::to_string(&key).unwrap();
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_signature_length_check() {
        let err = Signature::from_slice(&[0u8; 10]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidLength { expected: 64, actual: 10 });
    }
}
