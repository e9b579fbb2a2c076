// Output states and the contracts that govern them
//
// The protocol treats state contents opaquely; only the governing contract
// interprets the fields.

use std::collections::BTreeMap;
use std::fmt;

use attest_crypto::PublicKey;
use serde::{Deserialize, Serialize};

/// Identifier of the contract governing a state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    /// Create a new contract identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed record produced by business logic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputState {
    /// Record type, e.g. `CashOwningState`
    pub kind: String,
    /// Keys with an interest in the state
    pub participants: Vec<PublicKey>,
    /// Field values, ordered by name
    pub fields: BTreeMap<String, String>,
}

impl OutputState {
    /// Create an empty record of the given kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            participants: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a participant
    pub fn with_participant(mut self, key: PublicKey) -> Self {
        self.participants.push(key);
        self
    }

    /// Set a field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field value
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// An output state paired with its governing contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionState {
    pub data: OutputState,
    pub contract: ContractId,
}

impl TransactionState {
    /// Pair a state with its contract
    pub fn new(data: OutputState, contract: ContractId) -> Self {
        Self { data, contract }
    }
}
