// Finalization through the notary
//
// The committer checks the signature set locally, hands the signed
// transaction to the notary within a bounded wait, checks the notary's
// signature and broadcasts the result.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attest_crypto::{HashOutput, KeyPair, Signature};
use attest_error::{CommitError, CommitResult};
use attest_ledger::{
    FinalizedTransaction, NotarisationProof, Party, SignatureSet, SignedTransaction, UnsignedTransaction,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// The notary's decision on a signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarisationResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    pub notarised_at: DateTime<Utc>,
}

impl NotarisationResponse {
    /// An acceptance carrying the notary's signature
    pub fn accepted(signature: Signature) -> Self {
        Self {
            accepted: true,
            reason: None,
            signature: Some(signature),
            notarised_at: Utc::now(),
        }
    }

    /// A rejection with a reason
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
            signature: None,
            notarised_at: Utc::now(),
        }
    }
}

/// The notarizing authority
#[async_trait]
pub trait NotaryService: Send + Sync {
    /// Decide on a fully signed transaction
    async fn notarise(&self, tx: &SignedTransaction) -> CommitResult<NotarisationResponse>;
}

/// Receives finalized transactions
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Record and distribute a finalized transaction
    async fn broadcast(&self, tx: &FinalizedTransaction) -> CommitResult<()>;
}

/// Commits signed transactions
#[derive(Clone)]
pub struct Committer {
    notary: Arc<dyn NotaryService>,
    sink: Arc<dyn TransactionSink>,
    timeout: Duration,
}

impl Committer {
    /// Create a committer using `notary` and broadcasting to `sink`
    pub fn new(notary: Arc<dyn NotaryService>, sink: Arc<dyn TransactionSink>, timeout: Duration) -> Self {
        Self { notary, sink, timeout }
    }

    /// Finalize `tx` with the collected `signatures`.
    ///
    /// Fails with `IncompleteSignatures` before contacting the notary if any
    /// required signer is missing or any signature does not verify.
    pub async fn finalize(
        &self,
        tx: UnsignedTransaction,
        signatures: SignatureSet,
    ) -> CommitResult<FinalizedTransaction> {
        let signed = SignedTransaction::new(tx, signatures);
        signed.verify_required_signatures()?;
        let id = signed.id()?;

        debug!(id = %id, signatures = signed.signatures().len(), "Submitting to notary");
        let response = tokio::time::timeout(self.timeout, self.notary.notarise(&signed))
            .await
            .map_err(|_| CommitError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            })??;

        if !response.accepted {
            let reason = response.reason.unwrap_or_else(|| "no reason given".to_string());
            warn!(id = %id, reason = %reason, "Notary rejected transaction");
            return Err(CommitError::Rejected { reason });
        }

        let signature = response
            .signature
            .ok_or_else(|| CommitError::BadNotarySignature("acceptance carries no signature".to_string()))?;
        let proof = NotarisationProof {
            notary: signed.tx().notary().owning_key,
            signature,
            accepted: true,
            notarised_at: response.notarised_at,
        };
        proof
            .verify(&id)
            .map_err(|_| CommitError::BadNotarySignature(format!("signature does not cover {}", id)))?;

        let finalized = FinalizedTransaction::new(signed, proof)?;
        self.sink.broadcast(&finalized).await?;

        info!(id = %id, "Transaction finalized");
        Ok(finalized)
    }
}

impl std::fmt::Debug for Committer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Committer")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Uniqueness notary keeping the set of notarised ids in memory
pub struct InMemoryNotary {
    party: Party,
    keys: KeyPair,
    notarised: Mutex<HashSet<HashOutput>>,
    delay: Duration,
}

impl InMemoryNotary {
    /// Create a notary named `name` signing with `keys`
    pub fn new(name: impl Into<String>, keys: KeyPair) -> Self {
        Self {
            party: Party::new(name, keys.public_key()),
            keys,
            notarised: Mutex::new(HashSet::new()),
            delay: Duration::ZERO,
        }
    }

    /// Delay every decision by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The notary as a transaction party
    pub fn party(&self) -> Party {
        self.party.clone()
    }

    /// Number of transactions notarised
    pub fn notarised_count(&self) -> usize {
        self.notarised.lock().len()
    }
}

#[async_trait]
impl NotaryService for InMemoryNotary {
    async fn notarise(&self, tx: &SignedTransaction) -> CommitResult<NotarisationResponse> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if tx.tx().notary() != &self.party {
            return Ok(NotarisationResponse::rejected(format!(
                "transaction names notary {}, not {}",
                tx.tx().notary(),
                self.party
            )));
        }
        if let Err(e) = tx.verify_required_signatures() {
            return Ok(NotarisationResponse::rejected(e.to_string()));
        }

        let id = tx.id()?;
        if !self.notarised.lock().insert(id) {
            return Ok(NotarisationResponse::rejected(format!("{} has already been notarised", id)));
        }

        debug!(id = %id, notary = %self.party, "Notarised");
        Ok(NotarisationResponse::accepted(self.keys.sign(id.as_bytes())))
    }
}

impl std::fmt::Debug for InMemoryNotary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryNotary")
            .field("party", &self.party)
            .field("notarised", &self.notarised_count())
            .finish_non_exhaustive()
    }
}

/// Records finalized transactions in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    transactions: RwLock<Vec<FinalizedTransaction>>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded transactions, oldest first
    pub fn transactions(&self) -> Vec<FinalizedTransaction> {
        self.transactions.read().clone()
    }

    /// Find a recorded transaction by id
    pub fn get(&self, id: &HashOutput) -> Option<FinalizedTransaction> {
        self.transactions
            .read()
            .iter()
            .find(|tx| tx.id().ok().as_ref() == Some(id))
            .cloned()
    }

    /// Number of recorded transactions
    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

#[async_trait]
impl TransactionSink for InMemoryLedger {
    async fn broadcast(&self, tx: &FinalizedTransaction) -> CommitResult<()> {
        self.transactions.write().push(tx.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use attest_error::{AttestError, ErrorKind};
    use attest_ledger::{Command, ContractId, OutputState, TransactionBuilder, TransactionSignature};

    use super::*;

    struct Fixture {
        notary: Arc<InMemoryNotary>,
        ledger: Arc<InMemoryLedger>,
        initiator: KeyPair,
        oracle: KeyPair,
        tx: UnsignedTransaction,
    }

    fn fixture() -> Fixture {
        let notary = Arc::new(InMemoryNotary::new("O=Notary,L=London,C=GB", KeyPair::from_seed([1u8; 32])));
        let initiator = KeyPair::from_seed([2u8; 32]);
        let oracle = KeyPair::from_seed([3u8; 32]);
        let contract = ContractId::new("test.Cash");
        let tx = TransactionBuilder::new(notary.party())
            .add_output_state(OutputState::new("Cash"), contract.clone())
            .add_command(Command::business(contract.clone(), "Issue", [initiator.public_key()]))
            .add_command(Command::business(contract, "Attest", [oracle.public_key()]))
            .build()
            .unwrap();
        Fixture {
            notary,
            ledger: Arc::new(InMemoryLedger::new()),
            initiator,
            oracle,
            tx,
        }
    }

    fn committer(f: &Fixture) -> Committer {
        Committer::new(f.notary.clone(), f.ledger.clone(), Duration::from_secs(1))
    }

    fn full_set(f: &Fixture) -> SignatureSet {
        let id = f.tx.id().unwrap();
        SignatureSet::new()
            .with(TransactionSignature::sign(&f.initiator, &id))
            .with(TransactionSignature::sign(&f.oracle, &id))
    }

    #[tokio::test]
    async fn test_finalize_records_transaction() {
        let f = fixture();
        let finalized = committer(&f).finalize(f.tx.clone(), full_set(&f)).await.unwrap();

        assert!(finalized.notarisation().accepted);
        assert_eq!(finalized.notarisation().notary, f.notary.party().owning_key);
        assert_eq!(f.ledger.len(), 1);
        assert!(f.ledger.get(&f.tx.id().unwrap()).is_some());
    }

    #[tokio::test]
    async fn test_missing_signature_never_reaches_notary() {
        let f = fixture();
        let id = f.tx.id().unwrap();
        let partial = SignatureSet::new().with(TransactionSignature::sign(&f.initiator, &id));

        let err = committer(&f).finalize(f.tx.clone(), partial).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompleteSignatures);
        assert_eq!(f.notary.notarised_count(), 0);
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_double_spend_rejected() {
        let f = fixture();
        committer(&f).finalize(f.tx.clone(), full_set(&f)).await.unwrap();

        let err = committer(&f).finalize(f.tx.clone(), full_set(&f)).await.unwrap_err();
        assert!(matches!(err, CommitError::Rejected { .. }));
        assert_eq!(err.kind(), ErrorKind::NotarizationRejected);
        assert_eq!(f.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_notary_timeout() {
        let f = fixture();
        let slow = Arc::new(InMemoryNotary::new("O=Notary,L=London,C=GB", KeyPair::from_seed([1u8; 32])).with_delay(Duration::from_secs(5)));
        let committer = Committer::new(slow, f.ledger.clone(), Duration::from_millis(50));

        let err = committer.finalize(f.tx.clone(), full_set(&f)).await.unwrap_err();
        assert!(matches!(err, CommitError::Timeout { .. }));
        assert_eq!(err.kind(), ErrorKind::NotarizationRejected);
    }

    struct ForgingNotary;

    #[async_trait]
    impl NotaryService for ForgingNotary {
        async fn notarise(&self, tx: &SignedTransaction) -> CommitResult<NotarisationResponse> {
            let impostor = KeyPair::from_seed([66u8; 32]);
            Ok(NotarisationResponse::accepted(impostor.sign(tx.id()?.as_bytes())))
        }
    }

    #[tokio::test]
    async fn test_foreign_notary_signature_rejected() {
        let f = fixture();
        let committer = Committer::new(Arc::new(ForgingNotary), f.ledger.clone(), Duration::from_secs(1));
        let err = committer.finalize(f.tx.clone(), full_set(&f)).await.unwrap_err();
        assert!(matches!(err, CommitError::BadNotarySignature(_)));
        assert!(f.ledger.is_empty());
    }
}
