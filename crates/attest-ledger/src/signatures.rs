// Transaction signatures and their aggregation
//
// Every party signs the 32 id bytes of the transaction. A SignatureSet keeps
// at most one signature per key and can check that it covers a set of
// required signers.

use std::collections::{BTreeMap, BTreeSet};

use attest_crypto::{HashOutput, KeyPair, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, LedgerResult};

/// A signature over a transaction id together with the signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub by: PublicKey,
    pub signature: Signature,
}

impl TransactionSignature {
    /// Sign a transaction id
    pub fn sign(keys: &KeyPair, id: &HashOutput) -> Self {
        Self {
            by: keys.public_key(),
            signature: keys.sign(id.as_bytes()),
        }
    }

    /// Check the signature against a transaction id
    pub fn verify(&self, id: &HashOutput) -> LedgerResult<()> {
        self.by
            .verify(id.as_bytes(), &self.signature)
            .map_err(|_| LedgerError::InvalidSignature {
                signer: self.by.to_hex(),
            })
    }
}

/// Signatures collected for one transaction, keyed by signer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureSet {
    signatures: BTreeMap<PublicKey, Signature>,
}

impl SignatureSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature, replacing any earlier one by the same key
    pub fn insert(&mut self, signature: TransactionSignature) {
        self.signatures.insert(signature.by, signature.signature);
    }

    /// Builder-style insert
    pub fn with(mut self, signature: TransactionSignature) -> Self {
        self.insert(signature);
        self
    }

    /// Merge another set into this one
    pub fn merge(&mut self, other: SignatureSet) {
        self.signatures.extend(other.signatures);
    }

    /// Whether `key` has signed
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.signatures.contains_key(key)
    }

    /// Signature by `key`, if any
    pub fn get(&self, key: &PublicKey) -> Option<&Signature> {
        self.signatures.get(key)
    }

    /// Keys in `required` that have not signed
    pub fn missing(&self, required: &BTreeSet<PublicKey>) -> Vec<PublicKey> {
        required
            .iter()
            .filter(|key| !self.contains(key))
            .copied()
            .collect()
    }

    /// Fail with `IncompleteSignatures` unless every required key has signed
    pub fn ensure_covers(&self, required: &BTreeSet<PublicKey>) -> LedgerResult<()> {
        let missing = self.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::IncompleteSignatures {
                missing: missing.iter().map(PublicKey::to_hex).collect(),
            })
        }
    }

    /// Check every signature in the set against `id`
    pub fn verify_all(&self, id: &HashOutput) -> LedgerResult<()> {
        self.iter().try_for_each(|signature| signature.verify(id))
    }

    /// Iterate over the signatures in key order
    pub fn iter(&self) -> impl Iterator<Item = TransactionSignature> + '_ {
        self.signatures
            .iter()
            .map(|(by, signature)| TransactionSignature {
                by: *by,
                signature: *signature,
            })
    }

    /// Signing keys in order
    pub fn signers(&self) -> BTreeSet<PublicKey> {
        self.signatures.keys().copied().collect()
    }

    /// Number of signatures
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl FromIterator<TransactionSignature> for SignatureSet {
    fn from_iter<I: IntoIterator<Item = TransactionSignature>>(iter: I) -> Self {
        let mut set = SignatureSet::new();
        for signature in iter {
            set.insert(signature);
        }
        set
    }
}
