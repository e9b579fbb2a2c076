// Commands and their required signers

use std::collections::{BTreeMap, BTreeSet};

use attest_crypto::PublicKey;
use serde::{Deserialize, Serialize};

use crate::fact::Answer;
use crate::state::ContractId;

/// What a command asserts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandData {
    /// A business command interpreted by its contract, e.g. `Issue`
    Business {
        contract: ContractId,
        name: String,
        payload: BTreeMap<String, String>,
    },
    /// An oracle-attested fact
    Attestation(Answer),
}

/// A command together with the keys that must sign the transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub data: CommandData,
    pub signers: BTreeSet<PublicKey>,
}

impl Command {
    /// Create a new command
    pub fn new(data: CommandData, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            data,
            signers: signers.into_iter().collect(),
        }
    }

    /// Create a business command without payload
    pub fn business(
        contract: ContractId,
        name: impl Into<String>,
        signers: impl IntoIterator<Item = PublicKey>,
    ) -> Self {
        Self::new(
            CommandData::Business {
                contract,
                name: name.into(),
                payload: BTreeMap::new(),
            },
            signers,
        )
    }

    /// Create an attestation command signed by the oracle
    pub fn attestation(answer: Answer, oracle: PublicKey) -> Self {
        Self::new(CommandData::Attestation(answer), [oracle])
    }

    /// The attested answer, if this is an attestation command
    pub fn answer(&self) -> Option<&Answer> {
        match &self.data {
            CommandData::Attestation(answer) => Some(answer),
            CommandData::Business { .. } => None,
        }
    }

    /// Whether this command carries an oracle attestation
    pub fn is_attestation(&self) -> bool {
        self.answer().is_some()
    }

    /// Business command name and contract, if this is a business command
    pub fn business_name(&self) -> Option<(&ContractId, &str)> {
        match &self.data {
            CommandData::Business { contract, name, .. } => Some((contract, name.as_str())),
            CommandData::Attestation(_) => None,
        }
    }

    /// Whether `key` is among the required signers
    pub fn requires(&self, key: &PublicKey) -> bool {
        self.signers.contains(key)
    }
}
