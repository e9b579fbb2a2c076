// Unsigned transactions
//
// A transaction names exactly one notary, an ordered list of output states
// and an ordered list of commands. Its id is the Merkle root over the
// component leaves; every party signs that id.

use std::collections::BTreeSet;

use attest_crypto::{merkle_root, HashOutput, PublicKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::commitment::{component_nonce, leaf_hash};
use crate::component::{Component, ComponentGroup};
use crate::contract::ContractRegistry;
use crate::identity::Party;
use crate::state::{ContractId, TransactionState};
use crate::{LedgerError, LedgerResult};

/// Random salt mixed into every component nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrivacySalt([u8; 32]);

impl PrivacySalt {
    /// Wrap explicit salt bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Draw a fresh salt from the OS random source
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Raw salt bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A fully assembled transaction that has not been signed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    notary: Party,
    outputs: Vec<TransactionState>,
    commands: Vec<Command>,
    privacy_salt: PrivacySalt,
}

impl UnsignedTransaction {
    pub(crate) fn new(
        notary: Party,
        outputs: Vec<TransactionState>,
        commands: Vec<Command>,
        privacy_salt: PrivacySalt,
    ) -> Self {
        Self {
            notary,
            outputs,
            commands,
            privacy_salt,
        }
    }

    /// The notary that will finalize the transaction
    pub fn notary(&self) -> &Party {
        &self.notary
    }

    /// Output states in order
    pub fn outputs(&self) -> &[TransactionState] {
        &self.outputs
    }

    /// Commands in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Salt used to derive component nonces
    pub fn privacy_salt(&self) -> &PrivacySalt {
        &self.privacy_salt
    }

    /// All components in commitment order, with their group and index
    pub fn components(&self) -> Vec<(ComponentGroup, u32, Component<'_>)> {
        let mut components = Vec::with_capacity(1 + self.outputs.len() + self.commands.len());
        components.push((ComponentGroup::Notary, 0, Component::Notary(&self.notary)));
        components.extend(
            self.outputs
                .iter()
                .enumerate()
                .map(|(i, state)| (ComponentGroup::Outputs, i as u32, Component::Output(state))),
        );
        components.extend(
            self.commands
                .iter()
                .enumerate()
                .map(|(i, command)| (ComponentGroup::Commands, i as u32, Component::Command(command))),
        );
        components
    }

    /// Leaf hashes in commitment order
    pub fn leaves(&self) -> LedgerResult<Vec<HashOutput>> {
        self.components()
            .into_iter()
            .map(|(group, index, component)| {
                let nonce = component_nonce(self.privacy_salt.as_bytes(), group, index);
                Ok(leaf_hash(&nonce, &component.encode()?))
            })
            .collect()
    }

    /// Transaction id: the Merkle root over all component leaves
    pub fn id(&self) -> LedgerResult<HashOutput> {
        Ok(merkle_root(&self.leaves()?)?)
    }

    /// Union of the signers required by every command
    pub fn required_signers(&self) -> BTreeSet<PublicKey> {
        self.commands
            .iter()
            .flat_map(|command| command.signers.iter().copied())
            .collect()
    }

    /// Contracts referenced by outputs and business commands
    pub fn referenced_contracts(&self) -> BTreeSet<ContractId> {
        let from_outputs = self.outputs.iter().map(|state| state.contract.clone());
        let from_commands = self
            .commands
            .iter()
            .filter_map(|command| command.business_name().map(|(contract, _)| contract.clone()));
        from_outputs.chain(from_commands).collect()
    }

    /// Check the structural invariants the assembler guarantees
    pub fn check_structure(&self) -> LedgerResult<()> {
        if self.outputs.is_empty() {
            return Err(LedgerError::malformed("transaction has no outputs"));
        }
        if self.commands.is_empty() {
            return Err(LedgerError::malformed("transaction has no commands"));
        }
        if let Some(index) = self.commands.iter().position(|c| c.signers.is_empty()) {
            return Err(LedgerError::malformed(format!(
                "command #{} has no required signers",
                index
            )));
        }
        if let Some(index) = self
            .outputs
            .iter()
            .position(|state| state.contract.as_str().is_empty())
        {
            return Err(LedgerError::malformed(format!(
                "output #{} has no governing contract",
                index
            )));
        }
        Ok(())
    }

    /// Run structural checks, then every referenced contract's acceptance checks
    pub fn verify(&self, contracts: &ContractRegistry) -> LedgerResult<()> {
        self.check_structure()?;
        for contract_id in self.referenced_contracts() {
            let contract = contracts.get(&contract_id).ok_or_else(|| {
                LedgerError::contract_violation(contract_id.as_str(), "no contract registered under this id")
            })?;
            contract
                .verify(self)
                .map_err(|reason| LedgerError::contract_violation(contract_id.as_str(), reason))?;
        }
        Ok(())
    }
}
