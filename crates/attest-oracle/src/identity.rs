// Configured identity of the oracle a run talks to

use std::fmt;

use attest_crypto::PublicKey;
use attest_ledger::Party;
use serde::{Deserialize, Serialize};

/// Public key and network address of the oracle.
///
/// Every answer and counter-signature is checked against this identity; it is
/// passed in explicitly and never looked up from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleIdentity {
    /// Legal name of the oracle node
    pub name: String,
    /// Key the oracle signs answers and transactions with
    pub public_key: PublicKey,
    /// Base address of the oracle endpoint
    pub address: String,
}

impl OracleIdentity {
    /// Create a new oracle identity
    pub fn new(name: impl Into<String>, public_key: PublicKey, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_key,
            address: address.into(),
        }
    }

    /// The oracle as a transaction party
    pub fn party(&self) -> Party {
        Party::new(self.name.clone(), self.public_key)
    }
}

impl fmt::Display for OracleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.name, self.public_key.short(), self.address)
    }
}
