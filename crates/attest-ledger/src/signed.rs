// Signed and finalized transactions

use attest_crypto::{HashOutput, KeyPair, PublicKey, Signature};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signatures::SignatureSet;
use crate::transaction::UnsignedTransaction;
use crate::{LedgerError, LedgerResult};

/// A transaction together with the signatures collected so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    tx: UnsignedTransaction,
    signatures: SignatureSet,
}

impl SignedTransaction {
    /// Pair a transaction with a signature set
    pub fn new(tx: UnsignedTransaction, signatures: SignatureSet) -> Self {
        Self { tx, signatures }
    }

    /// The underlying transaction
    pub fn tx(&self) -> &UnsignedTransaction {
        &self.tx
    }

    /// Collected signatures
    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    /// Transaction id
    pub fn id(&self) -> LedgerResult<HashOutput> {
        self.tx.id()
    }

    /// Check that every required signer signed and every signature verifies
    pub fn verify_required_signatures(&self) -> LedgerResult<()> {
        self.signatures.ensure_covers(&self.tx.required_signers())?;
        self.signatures.verify_all(&self.tx.id()?)
    }
}

/// Evidence that the notary accepted a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarisationProof {
    pub notary: PublicKey,
    pub signature: Signature,
    pub accepted: bool,
    pub notarised_at: DateTime<Utc>,
}

impl NotarisationProof {
    /// Sign an acceptance of `id` with the notary's key
    pub fn accept(keys: &KeyPair, id: &HashOutput) -> Self {
        Self {
            notary: keys.public_key(),
            signature: keys.sign(id.as_bytes()),
            accepted: true,
            notarised_at: Utc::now(),
        }
    }

    /// Check the notary signature over `id`
    pub fn verify(&self, id: &HashOutput) -> LedgerResult<()> {
        self.notary
            .verify(id.as_bytes(), &self.signature)
            .map_err(|_| LedgerError::InvalidSignature {
                signer: self.notary.to_hex(),
            })
    }
}

/// A transaction accepted by its notary; produced exactly once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTransaction {
    transaction: SignedTransaction,
    notarisation: NotarisationProof,
}

impl FinalizedTransaction {
    /// Bind a signed transaction to its notarisation proof.
    ///
    /// The proof must be an acceptance signed by the transaction's notary.
    pub fn new(transaction: SignedTransaction, notarisation: NotarisationProof) -> LedgerResult<Self> {
        if !notarisation.accepted {
            return Err(LedgerError::malformed("notarisation proof does not record acceptance"));
        }
        if notarisation.notary != transaction.tx().notary().owning_key {
            return Err(LedgerError::InvalidSignature {
                signer: notarisation.notary.to_hex(),
            });
        }
        notarisation.verify(&transaction.id()?)?;
        Ok(Self {
            transaction,
            notarisation,
        })
    }

    /// The signed transaction
    pub fn transaction(&self) -> &SignedTransaction {
        &self.transaction
    }

    /// The notary's acceptance
    pub fn notarisation(&self) -> &NotarisationProof {
        &self.notarisation
    }

    /// Transaction id
    pub fn id(&self) -> LedgerResult<HashOutput> {
        self.transaction.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::command::Command;
    use crate::identity::Party;
    use crate::state::{ContractId, OutputState};
    use crate::signatures::TransactionSignature;

    struct Fixture {
        notary: KeyPair,
        initiator: KeyPair,
        tx: UnsignedTransaction,
    }

    fn fixture() -> Fixture {
        let notary = KeyPair::from_seed([1u8; 32]);
        let initiator = KeyPair::from_seed([2u8; 32]);
        let contract = ContractId::new("test.Cash");
        let tx = TransactionBuilder::new(Party::new("Notary", notary.public_key()))
            .add_output_state(OutputState::new("Cash").with_field("amount", "10"), contract.clone())
            .add_command(Command::business(contract, "Issue", [initiator.public_key()]))
            .build()
            .unwrap();
        Fixture { notary, initiator, tx }
    }

    fn signed_by_initiator(tx: UnsignedTransaction, initiator: &KeyPair) -> SignedTransaction {
        let id = tx.id().unwrap();
        SignedTransaction::new(tx, SignatureSet::new().with(TransactionSignature::sign(initiator, &id)))
    }

    #[test]
    fn test_initial_signature_covers_initiator() {
        let f = fixture();
        let signed = signed_by_initiator(f.tx.clone(), &f.initiator);
        assert!(signed.verify_required_signatures().is_ok());
    }

    #[test]
    fn test_finalize_requires_matching_notary() {
        let f = fixture();
        let signed = signed_by_initiator(f.tx.clone(), &f.initiator);
        let id = signed.id().unwrap();

        let good = NotarisationProof::accept(&f.notary, &id);
        let finalized = FinalizedTransaction::new(signed.clone(), good).unwrap();
        assert_eq!(finalized.id().unwrap(), id);

        let impostor = NotarisationProof::accept(&KeyPair::from_seed([8u8; 32]), &id);
        assert!(FinalizedTransaction::new(signed.clone(), impostor).is_err());

        let mut refused = NotarisationProof::accept(&f.notary, &id);
        refused.accepted = false;
        assert!(FinalizedTransaction::new(signed, refused).is_err());
    }

    #[test]
    fn test_signed_transaction_json_shape() {
        let f = fixture();
        let signed = signed_by_initiator(f.tx.clone(), &f.initiator);
        let json = serde_json::to_value(&signed).unwrap();
        assert!(json.get("notary").is_some());
        assert!(json.get("outputs").is_some());
        assert!(json.get("commands").is_some());
        assert!(json["signatures"].get(f.initiator.public_key().to_hex()).is_some());

        let back: SignedTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, signed);
    }
}
