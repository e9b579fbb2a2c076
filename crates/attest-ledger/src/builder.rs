// Transaction assembly
//
// Collects a notary, output states and commands and produces an
// UnsignedTransaction once the structural invariants hold.

use tracing::debug;

use crate::command::Command;
use crate::identity::Party;
use crate::state::{ContractId, OutputState, TransactionState};
use crate::transaction::{PrivacySalt, UnsignedTransaction};
use crate::{LedgerError, LedgerResult};

/// Builder for unsigned transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    notary: Party,
    conflicting_notary: Option<Party>,
    outputs: Vec<TransactionState>,
    commands: Vec<Command>,
    privacy_salt: Option<PrivacySalt>,
}

impl TransactionBuilder {
    /// Start a transaction finalized by `notary`
    pub fn new(notary: Party) -> Self {
        Self {
            notary,
            conflicting_notary: None,
            outputs: Vec::new(),
            commands: Vec::new(),
            privacy_salt: None,
        }
    }

    /// Name the notary again; a different notary makes `build` fail
    pub fn notary(mut self, notary: Party) -> Self {
        if notary != self.notary && self.conflicting_notary.is_none() {
            self.conflicting_notary = Some(notary);
        }
        self
    }

    /// Add an output state governed by `contract`
    pub fn add_output_state(mut self, state: OutputState, contract: ContractId) -> Self {
        self.outputs.push(TransactionState::new(state, contract));
        self
    }

    /// Add a command
    pub fn add_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Use a fixed privacy salt instead of a random one
    pub fn with_privacy_salt(mut self, salt: PrivacySalt) -> Self {
        self.privacy_salt = Some(salt);
        self
    }

    /// Assemble the transaction
    pub fn build(self) -> LedgerResult<UnsignedTransaction> {
        if let Some(other) = &self.conflicting_notary {
            return Err(LedgerError::malformed(format!(
                "transaction already names notary {}, cannot also use {}",
                self.notary, other
            )));
        }

        let tx = UnsignedTransaction::new(
            self.notary,
            self.outputs,
            self.commands,
            self.privacy_salt.unwrap_or_else(PrivacySalt::random),
        );
        tx.check_structure()?;

        debug!(
            outputs = tx.outputs().len(),
            commands = tx.commands().len(),
            notary = %tx.notary(),
            "Assembled transaction"
        );
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attest_crypto::KeyPair;

    use super::*;
    use crate::contract::{Contract, ContractRegistry};
    use crate::fact::{Answer, Proof, ProofType};

    #[derive(Debug)]
    struct PositiveAmount;

    impl Contract for PositiveAmount {
        fn id(&self) -> ContractId {
            ContractId::new("test.PositiveAmount")
        }

        fn verify(&self, tx: &UnsignedTransaction) -> Result<(), String> {
            for output in tx.outputs() {
                let amount: i64 = output
                    .data
                    .field("amount")
                    .ok_or("missing amount")?
                    .parse()
                    .map_err(|_| "amount is not a number".to_string())?;
                if amount <= 0 {
                    return Err("amount must be positive".to_string());
                }
            }
            Ok(())
        }
    }

    fn notary() -> Party {
        Party::new("O=Notary,L=London,C=GB", KeyPair::from_seed([1u8; 32]).public_key())
    }

    fn builder_with(amount: &str) -> TransactionBuilder {
        let me = KeyPair::from_seed([2u8; 32]).public_key();
        let oracle = KeyPair::from_seed([3u8; 32]).public_key();
        let contract = ContractId::new("test.PositiveAmount");
        let answer = Answer::new("25000.12", Proof::new(ProofType::Native, vec![1]), oracle);

        TransactionBuilder::new(notary())
            .add_output_state(
                OutputState::new("Cash").with_participant(me).with_field("amount", amount),
                contract.clone(),
            )
            .add_command(Command::business(contract, "Issue", [me]))
            .add_command(Command::attestation(answer, oracle))
    }

    #[test]
    fn test_build_valid_transaction() {
        let tx = builder_with("10").build().unwrap();
        assert_eq!(tx.outputs().len(), 1);
        assert_eq!(tx.commands().len(), 2);
        assert_eq!(tx.required_signers().len(), 2);

        let registry = ContractRegistry::new().with_contract(Arc::new(PositiveAmount));
        assert!(tx.verify(&registry).is_ok());
    }

    #[test]
    fn test_contract_violation() {
        let tx = builder_with("-5").build().unwrap();
        let registry = ContractRegistry::new().with_contract(Arc::new(PositiveAmount));
        let err = tx.verify(&registry).unwrap_err();
        assert!(matches!(err, LedgerError::ContractViolation { .. }));
    }

    #[test]
    fn test_unknown_contract_is_a_violation() {
        let tx = builder_with("10").build().unwrap();
        let err = tx.verify(&ContractRegistry::new()).unwrap_err();
        assert!(matches!(err, LedgerError::ContractViolation { .. }));
    }

    #[test]
    fn test_second_notary_rejected() {
        let other = Party::new("O=Other,L=Paris,C=FR", KeyPair::from_seed([9u8; 32]).public_key());
        assert!(builder_with("10").notary(notary()).build().is_ok());
        let err = builder_with("10").notary(other).build().unwrap_err();
        assert!(matches!(err, LedgerError::MalformedTransaction(_)));
    }

    #[test]
    fn test_missing_commands_or_outputs_rejected() {
        let me = KeyPair::from_seed([2u8; 32]).public_key();
        let contract = ContractId::new("test.PositiveAmount");

        let no_commands = TransactionBuilder::new(notary())
            .add_output_state(OutputState::new("Cash"), contract.clone())
            .build();
        assert!(no_commands.is_err());

        let no_outputs = TransactionBuilder::new(notary())
            .add_command(Command::business(contract.clone(), "Issue", [me]))
            .build();
        assert!(no_outputs.is_err());

        let unsigned_command = TransactionBuilder::new(notary())
            .add_output_state(OutputState::new("Cash"), contract.clone())
            .add_command(Command::business(contract, "Issue", Vec::<attest_crypto::PublicKey>::new()))
            .build();
        assert!(unsigned_command.is_err());
    }

    #[test]
    fn test_fixed_salt_gives_stable_id() {
        let salt = PrivacySalt::new([5u8; 32]);
        let a = builder_with("10").with_privacy_salt(salt).build().unwrap();
        let b = builder_with("10").with_privacy_salt(salt).build().unwrap();
        assert_eq!(a.id().unwrap(), b.id().unwrap());

        let c = builder_with("11").with_privacy_salt(salt).build().unwrap();
        assert_ne!(a.id().unwrap(), c.id().unwrap());
    }
}
