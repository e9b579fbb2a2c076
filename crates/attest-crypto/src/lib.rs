// Cryptographic primitives and utilities
//
// This module provides the cryptographic primitives used by the attestation
// protocol: content hashing, Ed25519 keys and signatures, and the Merkle
// commitment used to bind filtered transaction views to their full form.

pub mod hash;
pub mod merkle;
pub mod signature;

mod macros;

pub use attest_error::{CryptoError, CryptoResult};

pub use hash::{content_hash, domain_hash, sha256, HashOutput};
pub use merkle::{merkle_root, MerkleTree};
pub use signature::{KeyPair, PublicKey, Signature};
