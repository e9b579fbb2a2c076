// Oracle side of the attestation protocol
//
// Querying the oracle, verifying the proofs it attaches, the disclosure rule
// for its counter-signature and collecting that signature. Two transports are
// provided: HTTP to a remote oracle and an in-process oracle service.

pub mod client;
pub mod collector;
pub mod http;
pub mod identity;
pub mod predicate;
pub mod service;
pub mod verifier;

pub use attest_error::{OracleError, OracleResult};

pub use client::{AnswerEnvelope, ExternalFactOracle, OracleTransport};
pub use collector::{combine, SignatureCollector};
pub use http::HttpOracleTransport;
pub use identity::OracleIdentity;
pub use predicate::OracleDisclosure;
pub use service::{FactSource, LocalOracleService, NotarizedTranscriptSource, StaticFactSource};
pub use verifier::{
    ProofVerifier, ProofVerifierRegistry, SignedTranscriptVerifier, StaticVerifier, TranscriptEvidence,
    VerificationFailure, VerificationResult,
};
