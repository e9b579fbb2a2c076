// Contract verification
//
// A contract is identified by its id and accepts or rejects an assembled
// transaction. The registry maps every id a transaction may reference to its
// implementation.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::state::ContractId;
use crate::transaction::UnsignedTransaction;

/// Acceptance rules governing a kind of state
pub trait Contract: Send + Sync + Debug {
    /// Identifier states and commands use to reference this contract
    fn id(&self) -> ContractId;

    /// Accept or reject the transaction, returning the rejection reason
    fn verify(&self, tx: &UnsignedTransaction) -> Result<(), String>;
}

/// Contracts known to a node
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: HashMap<ContractId, Arc<dyn Contract>>,
}

impl ContractRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract under its own id, replacing any previous entry
    pub fn register(&mut self, contract: Arc<dyn Contract>) {
        self.contracts.insert(contract.id(), contract);
    }

    /// Builder-style registration
    pub fn with_contract(mut self, contract: Arc<dyn Contract>) -> Self {
        self.register(contract);
        self
    }

    /// Look up a contract by id
    pub fn get(&self, id: &ContractId) -> Option<Arc<dyn Contract>> {
        self.contracts.get(id).cloned()
    }

    /// Number of registered contracts
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether no contract is registered
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
