// Well-known parties taking part in a transaction

use std::fmt;

use attest_crypto::PublicKey;
use serde::{Deserialize, Serialize};

/// A named participant and the key it signs with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Human-readable name, e.g. `O=Notary,L=London,C=GB`
    pub name: String,
    /// Key the party signs transactions with
    pub owning_key: PublicKey,
}

impl Party {
    /// Create a new party
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.owning_key.short())
    }
}
