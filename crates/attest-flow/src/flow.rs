// Oracle-assisted issuance flow
//
// One run queries the oracle, gates on the answer's proof, assembles the
// issuance transaction, shows the oracle only its attestation, collects the
// oracle's counter-signature, merges it with ours and finalizes through the
// notary. Runs share nothing mutable; the first failure ends a run.

use std::sync::Arc;

use attest_crypto::KeyPair;
use attest_error::{
    AttestError, CommitError, ErrorCode, ErrorDomain, ErrorKind, LedgerError, OracleError,
};
use attest_ledger::{
    Command, ContractRegistry, DisclosurePredicate, FilteredTransaction, FinalizedTransaction, Party,
    TransactionBuilder, TransactionSignature,
};
use attest_oracle::{
    combine, ExternalFactOracle, OracleDisclosure, OracleIdentity, OracleTransport, ProofVerifierRegistry,
    SignatureCollector,
};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};

use crate::commit::{Committer, NotaryService, TransactionSink};
use crate::config::FlowConfig;
use crate::issue::{CashIssueContract, CashOwningState};
use crate::progress::{ProgressError, ProgressTracker, ProtocolStep};

/// Flow error codes
pub mod codes {
    use attest_error::ErrorCode;

    // Flow error codes start with 7000
    pub const OUT_OF_ORDER: ErrorCode = ErrorCode(7001);
}

/// The underlying failure that ended a run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowFailure {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl FlowFailure {
    fn inner(&self) -> Option<&dyn AttestError> {
        match self {
            FlowFailure::Oracle(e) => Some(e),
            FlowFailure::Ledger(e) => Some(e),
            FlowFailure::Commit(e) => Some(e),
            FlowFailure::Progress(_) => None,
        }
    }

    /// Protocol failure kind
    pub fn kind(&self) -> ErrorKind {
        self.inner().map(|e| e.kind()).unwrap_or(ErrorKind::Internal)
    }
}

/// A failed run: the step it failed in, the failure kind and its cause
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {step}: {source}")]
pub struct FlowError {
    pub step: ProtocolStep,
    pub kind: ErrorKind,
    #[source]
    pub source: FlowFailure,
}

impl AttestError for FlowError {
    fn code(&self) -> ErrorCode {
        self.source.inner().map(|e| e.code()).unwrap_or(codes::OUT_OF_ORDER)
    }

    fn domain(&self) -> ErrorDomain {
        self.source.inner().map(|e| e.domain()).unwrap_or(ErrorDomain::Flow)
    }

    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Result type of a flow run
pub type FlowResult<T> = Result<T, FlowError>;

/// External collaborators of the flow
#[derive(Clone)]
pub struct FlowServices {
    /// Channel to the oracle
    pub oracle_transport: Arc<dyn OracleTransport>,
    /// Proof verifiers by proof type
    pub verifiers: Arc<ProofVerifierRegistry>,
    /// Contracts the assembled transaction is checked against
    pub contracts: Arc<ContractRegistry>,
    /// The notarizing authority
    pub notary: Arc<dyn NotaryService>,
    /// Where finalized transactions go
    pub sink: Arc<dyn TransactionSink>,
}

/// Issues cash conditioned on an oracle-attested fact
#[derive(Clone)]
pub struct OracleIssueFlow {
    config: Arc<FlowConfig>,
    initiator: Arc<KeyPair>,
    notary: Party,
    oracle_identity: Arc<OracleIdentity>,
    oracle: ExternalFactOracle,
    collector: SignatureCollector,
    verifiers: Arc<ProofVerifierRegistry>,
    contracts: Arc<ContractRegistry>,
    committer: Committer,
    disclosure: Arc<dyn DisclosurePredicate>,
}

impl OracleIssueFlow {
    /// Wire a flow for `initiator`, finalized by `notary`, attested by the
    /// oracle named in `config`
    pub fn new(
        config: FlowConfig,
        initiator: Arc<KeyPair>,
        notary: Party,
        services: FlowServices,
    ) -> anyhow::Result<Self> {
        let oracle = Arc::new(config.require_oracle()?.clone());
        let timeouts = config.timeouts;
        Ok(Self {
            oracle: ExternalFactOracle::new(oracle.clone(), services.oracle_transport.clone(), timeouts.query()),
            collector: SignatureCollector::new(oracle.clone(), services.oracle_transport, timeouts.sign()),
            committer: Committer::new(services.notary, services.sink, timeouts.notary()),
            verifiers: services.verifiers,
            contracts: services.contracts,
            disclosure: Arc::new(OracleDisclosure),
            config: Arc::new(config),
            initiator,
            notary,
            oracle_identity: oracle,
        })
    }

    /// Replace the rule deciding what the oracle sees
    pub fn with_disclosure(mut self, disclosure: Arc<dyn DisclosurePredicate>) -> Self {
        self.disclosure = disclosure;
        self
    }

    /// Flow configuration
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Execute one run
    pub async fn run(&self) -> FlowResult<FinalizedTransaction> {
        let mut tracker = ProgressTracker::new();
        self.run_tracked(&mut tracker).await
    }

    /// Execute one run, recording its progress in `tracker`
    pub async fn run_tracked(&self, tracker: &mut ProgressTracker) -> FlowResult<FinalizedTransaction> {
        let run = format!("{:016x}", rand::random::<u64>());
        let span = info_span!("oracle_issue", run = %run, oracle = %self.oracle_identity.name);
        self.execute(tracker).instrument(span).await
    }

    /// Execute runs until one succeeds, restarting from QUERYING with fresh
    /// state after transient failures, at most `retry_attempts` times
    pub async fn run_with_retry(&self) -> FlowResult<FinalizedTransaction> {
        let mut attempt = 0;
        loop {
            match self.run().await {
                Ok(finalized) => return Ok(finalized),
                Err(e) if e.kind.is_transient() && attempt < self.config.retry_attempts => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max = self.config.retry_attempts,
                        error = %e,
                        "Transient failure, restarting run"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute(&self, tracker: &mut ProgressTracker) -> FlowResult<FinalizedTransaction> {
        let me = self.initiator.public_key();
        let oracle_key = self.oracle_identity.public_key;
        let query = &self.config.query;

        enter(tracker, ProtocolStep::Querying)?;
        let answer = self.oracle.query(query).await.map_err(|e| fail(tracker, e))?;

        enter(tracker, ProtocolStep::Verifying)?;
        let verification = self.verifiers.verify_answer(query, &answer);
        if let Some(failure) = verification.failure {
            return Err(fail(
                tracker,
                OracleError::ProofInvalid {
                    proof_type: answer.proof.proof_type.to_string(),
                    reason: failure.to_string(),
                },
            ));
        }
        info!(value = %answer.value, method = %verification.method, "Proof verified");

        enter(tracker, ProtocolStep::Building)?;
        let issued = CashOwningState::new(self.config.issued_amount, me);
        let tx = TransactionBuilder::new(self.notary.clone())
            .add_output_state(issued.to_output_state(), CashIssueContract::contract_id())
            .add_command(CashIssueContract::issue_command(me))
            .add_command(Command::attestation(answer, oracle_key))
            .build()
            .and_then(|tx| tx.verify(&self.contracts).map(|_| tx))
            .map_err(|e| fail(tracker, e))?;
        let id = tx.id().map_err(|e| fail(tracker, e))?;

        enter(tracker, ProtocolStep::Filtering)?;
        let view = FilteredTransaction::build(&tx, self.disclosure.as_ref(), &oracle_key)
            .map_err(|e| fail(tracker, e))?;

        enter(tracker, ProtocolStep::AwaitingOracleSignature)?;
        let oracle_signature = self
            .collector
            .request_counter_signature(&view)
            .await
            .map_err(|e| fail(tracker, e))?;
        drop(view);

        enter(tracker, ProtocolStep::CollectingSignatures)?;
        let ours = TransactionSignature::sign(&self.initiator, &id);
        let signatures = combine(ours, oracle_signature);

        enter(tracker, ProtocolStep::Finalizing)?;
        let finalized = self
            .committer
            .finalize(tx, signatures)
            .await
            .map_err(|e| fail(tracker, e))?;

        enter(tracker, ProtocolStep::Done)?;
        info!(id = %id, "Issuance complete");
        Ok(finalized)
    }
}

impl std::fmt::Debug for OracleIssueFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleIssueFlow")
            .field("initiator", &self.initiator.public_key())
            .field("notary", &self.notary)
            .field("oracle", &self.oracle_identity)
            .finish_non_exhaustive()
    }
}

fn enter(tracker: &mut ProgressTracker, step: ProtocolStep) -> FlowResult<()> {
    tracker.advance(step).map_err(|e| FlowError {
        step,
        kind: ErrorKind::Internal,
        source: e.into(),
    })
}

fn fail(tracker: &mut ProgressTracker, source: impl Into<FlowFailure>) -> FlowError {
    let source = source.into();
    let kind = source.kind();
    let step = tracker.current().unwrap_or(ProtocolStep::Querying);
    warn!(step = %step, kind = %kind, error = %source, "Run failed");
    if let Err(e) = tracker.fail(kind) {
        warn!(error = %e, "Could not record failure");
    }
    FlowError { step, kind, source }
}
