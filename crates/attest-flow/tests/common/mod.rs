// Shared fixtures for flow integration tests

#![allow(dead_code)]

use std::sync::Arc;

use attest_crypto::KeyPair;
use attest_flow::{
    init_test_logging, CashIssueContract, FlowConfig, FlowServices, InMemoryLedger, InMemoryNotary,
    OracleIssueFlow,
};
use attest_ledger::{ContractRegistry, ProofType};
use attest_oracle::{
    LocalOracleService, NotarizedTranscriptSource, OracleIdentity, OracleTransport, ProofVerifierRegistry,
    SignedTranscriptVerifier,
};

pub const ORACLE_VALUE: &str = "25000.12";

/// Everything a run talks to, in-process
pub struct Harness {
    pub initiator: Arc<KeyPair>,
    pub oracle_keys: KeyPair,
    pub transport_notary: KeyPair,
    pub identity: Arc<OracleIdentity>,
    pub oracle: Arc<LocalOracleService>,
    pub notary: Arc<InMemoryNotary>,
    pub ledger: Arc<InMemoryLedger>,
    pub verifiers: Arc<ProofVerifierRegistry>,
    pub contracts: Arc<ContractRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_oracle(|service| service)
    }

    /// Build a harness, letting the caller adjust the oracle service
    pub fn with_oracle(adjust: impl FnOnce(LocalOracleService) -> LocalOracleService) -> Self {
        init_test_logging();

        let oracle_keys = KeyPair::from_seed([3u8; 32]);
        let transport_notary = KeyPair::from_seed([21u8; 32]);
        let facts = NotarizedTranscriptSource::new(ORACLE_VALUE, transport_notary.clone());
        let oracle = adjust(LocalOracleService::new(oracle_keys.clone(), Arc::new(facts)));

        let verifiers = ProofVerifierRegistry::new().with_verifier(Arc::new(SignedTranscriptVerifier::new(
            ProofType::TlsNotary,
            [transport_notary.public_key()],
        )));
        let contracts = ContractRegistry::new().with_contract(Arc::new(CashIssueContract));

        Self {
            initiator: Arc::new(KeyPair::from_seed([2u8; 32])),
            identity: Arc::new(OracleIdentity::new(
                "O=Oracle,L=London,C=GB",
                oracle_keys.public_key(),
                "in-process",
            )),
            oracle_keys,
            transport_notary,
            oracle: Arc::new(oracle),
            notary: Arc::new(InMemoryNotary::new("O=Notary,L=London,C=GB", KeyPair::from_seed([1u8; 32]))),
            ledger: Arc::new(InMemoryLedger::new()),
            verifiers: Arc::new(verifiers),
            contracts: Arc::new(contracts),
        }
    }

    pub fn config(&self) -> FlowConfig {
        FlowConfig::new()
            .with_oracle((*self.identity).clone())
            .with_query_timeout(2_000)
            .with_sign_timeout(2_000)
            .with_notary_timeout(2_000)
    }

    pub fn services(&self) -> FlowServices {
        self.services_with(self.oracle.clone())
    }

    pub fn services_with(&self, transport: Arc<dyn OracleTransport>) -> FlowServices {
        FlowServices {
            oracle_transport: transport,
            verifiers: self.verifiers.clone(),
            contracts: self.contracts.clone(),
            notary: self.notary.clone(),
            sink: self.ledger.clone(),
        }
    }

    pub fn flow(&self) -> OracleIssueFlow {
        self.flow_with(self.config())
    }

    pub fn flow_with(&self, config: FlowConfig) -> OracleIssueFlow {
        self.flow_with_services(config, self.services())
    }

    pub fn flow_with_services(&self, config: FlowConfig, services: FlowServices) -> OracleIssueFlow {
        OracleIssueFlow::new(config, self.initiator.clone(), self.notary.party(), services).unwrap()
    }
}
