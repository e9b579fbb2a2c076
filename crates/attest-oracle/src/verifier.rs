// Proof verification for oracle answers
//
// Verifiers are pure: the same proof, query and claimed value always give the
// same result. A registry routes each proof to the verifier for its type.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug};
use std::sync::Arc;

use attest_crypto::{sha256, KeyPair, PublicKey, Signature};
use attest_error::{LedgerError, OracleResult};
use attest_ledger::{Answer, Proof, ProofType, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Why a proof was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The proof carries no evidence
    EmptyEvidence,
    /// The proof is not of the type that was requested
    TypeMismatch { expected: ProofType, actual: ProofType },
    /// The evidence could not be decoded
    MalformedEvidence(String),
    /// The evidence digest does not match its contents
    DigestMismatch,
    /// The evidence is signed by a key outside the trusted set
    UntrustedSigner(PublicKey),
    /// The evidence signature does not verify
    BadSignature,
    /// The transcript was not obtained from the queried source
    SourceNotInTranscript,
    /// The field the query selects is absent or differs from the attested value
    ValueNotInTranscript,
    /// The query expression cannot be evaluated against evidence
    UnsupportedExpression(String),
    /// No verifier handles this proof type
    Unsupported(ProofType),
    /// A fixed verdict from a static verifier
    Rejected(String),
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationFailure::EmptyEvidence => write!(f, "empty evidence"),
            VerificationFailure::TypeMismatch { expected, actual } => {
                write!(f, "expected {} proof, got {}", expected, actual)
            }
            VerificationFailure::MalformedEvidence(reason) => write!(f, "malformed evidence: {}", reason),
            VerificationFailure::DigestMismatch => write!(f, "transcript digest mismatch"),
            VerificationFailure::UntrustedSigner(key) => write!(f, "untrusted evidence signer {}", key.short()),
            VerificationFailure::BadSignature => write!(f, "evidence signature does not verify"),
            VerificationFailure::SourceNotInTranscript => write!(f, "transcript does not request the queried source"),
            VerificationFailure::ValueNotInTranscript => write!(f, "attested value not found in transcript"),
            VerificationFailure::UnsupportedExpression(expression) => {
                write!(f, "cannot evaluate expression {}", expression)
            }
            VerificationFailure::Unsupported(proof_type) => write!(f, "no verifier for {}", proof_type),
            VerificationFailure::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of verifying a proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Name of the verifier that produced the result
    pub method: String,
    /// `None` when the proof verified
    pub failure: Option<VerificationFailure>,
}

impl VerificationResult {
    /// A successful verification
    pub fn success(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            failure: None,
        }
    }

    /// A failed verification
    pub fn failure(method: impl Into<String>, failure: VerificationFailure) -> Self {
        Self {
            method: method.into(),
            failure: Some(failure),
        }
    }

    /// Whether the proof verified
    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }
}

/// Verifies the evidence attached to an oracle answer
pub trait ProofVerifier: Send + Sync + Debug {
    /// Verifier name, reported in results
    fn name(&self) -> &str;

    /// Proof type this verifier handles
    fn proof_type(&self) -> ProofType;

    /// Verify `proof` as evidence that `query` evaluates to `claimed_value`
    fn verify(&self, proof: &Proof, query: &Query, claimed_value: &str) -> VerificationResult;
}

/// Routes proofs to the verifier registered for their type
#[derive(Debug, Clone, Default)]
pub struct ProofVerifierRegistry {
    verifiers: HashMap<ProofType, Arc<dyn ProofVerifier>>,
}

impl ProofVerifierRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verifier for its proof type, replacing any previous one
    pub fn register(&mut self, verifier: Arc<dyn ProofVerifier>) {
        self.verifiers.insert(verifier.proof_type(), verifier);
    }

    /// Builder-style registration
    pub fn with_verifier(mut self, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.register(verifier);
        self
    }

    /// Whether a verifier is registered for `proof_type`
    pub fn supports(&self, proof_type: ProofType) -> bool {
        self.verifiers.contains_key(&proof_type)
    }

    /// Verify a proof with the verifier registered for its type
    pub fn verify(&self, proof: &Proof, query: &Query, claimed_value: &str) -> VerificationResult {
        match self.verifiers.get(&proof.proof_type) {
            Some(verifier) => verifier.verify(proof, query, claimed_value),
            None => VerificationResult::failure("registry", VerificationFailure::Unsupported(proof.proof_type)),
        }
    }

    /// Verify an answer against the query it responds to
    pub fn verify_answer(&self, query: &Query, answer: &Answer) -> VerificationResult {
        if answer.proof.proof_type != query.proof_type {
            return VerificationResult::failure(
                "registry",
                VerificationFailure::TypeMismatch {
                    expected: query.proof_type,
                    actual: answer.proof.proof_type,
                },
            );
        }
        let result = self.verify(&answer.proof, query, &answer.value);
        debug!(
            proof_type = %answer.proof.proof_type,
            method = %result.method,
            valid = result.is_valid(),
            "Verified answer proof"
        );
        result
    }
}

/// Evidence produced by a transport notary: a transcript, its SHA-256 digest
/// and the notary's signature over the digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvidence {
    pub transcript: String,
    pub digest: String,
    pub notary: PublicKey,
    pub signature: Signature,
}

impl TranscriptEvidence {
    /// Notarize a transcript with the transport notary's key
    pub fn notarize(transcript: impl Into<String>, notary: &KeyPair) -> Self {
        let transcript = transcript.into();
        let digest = sha256(transcript.as_bytes());
        Self {
            digest: hex::encode(digest),
            notary: notary.public_key(),
            signature: notary.sign(&digest),
            transcript,
        }
    }

    /// Encode as proof evidence bytes
    pub fn to_evidence(&self) -> OracleResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LedgerError::EncodingError(e.to_string()).into())
    }

    /// Response body: everything after the last blank line
    fn body(&self) -> &str {
        self.transcript
            .rsplit_once("\r\n\r\n")
            .map(|(_, body)| body)
            .unwrap_or(&self.transcript)
    }

    /// Request and response headers
    fn head(&self) -> &str {
        self.transcript
            .rsplit_once("\r\n\r\n")
            .map(|(head, _)| head)
            .unwrap_or("")
    }
}

/// A `json(<url>).<path>` query expression
#[derive(Debug, Clone, PartialEq, Eq)]
struct JsonSelector<'a> {
    url: &'a str,
    path: Vec<&'a str>,
}

impl<'a> JsonSelector<'a> {
    fn parse(expression: &'a str) -> Result<Self, VerificationFailure> {
        let unsupported = || VerificationFailure::UnsupportedExpression(expression.to_string());
        let rest = expression.strip_prefix("json(").ok_or_else(unsupported)?;
        let (url, path) = rest.rsplit_once(')').ok_or_else(unsupported)?;
        if url.is_empty() {
            return Err(unsupported());
        }
        let path = match path {
            "" => Vec::new(),
            path => {
                let segments: Vec<&str> = path.strip_prefix('.').ok_or_else(unsupported)?.split('.').collect();
                if segments.iter().any(|segment| segment.is_empty()) {
                    return Err(unsupported());
                }
                segments
            }
        };
        Ok(Self { url, path })
    }

    /// Follow the path through `document`; numeric segments index arrays
    fn select<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.path.iter().try_fold(document, |value, segment| match value {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Object(fields) => fields.get(*segment),
            _ => None,
        })
    }
}

/// Whether a selected JSON scalar is exactly the claimed value
fn scalar_matches(selected: &Value, claimed_value: &str) -> bool {
    match selected {
        Value::String(text) => text == claimed_value,
        Value::Number(number) => match (number.as_f64(), claimed_value.parse::<f64>()) {
            (Some(actual), Ok(claimed)) => actual == claimed,
            _ => false,
        },
        Value::Bool(flag) => flag.to_string() == claimed_value,
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Verifies transport-notarized transcripts
#[derive(Debug, Clone)]
pub struct SignedTranscriptVerifier {
    proof_type: ProofType,
    trusted_notaries: BTreeSet<PublicKey>,
}

impl SignedTranscriptVerifier {
    /// Create a verifier trusting the given transport notaries
    pub fn new(proof_type: ProofType, trusted_notaries: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            proof_type,
            trusted_notaries: trusted_notaries.into_iter().collect(),
        }
    }

    fn check(&self, proof: &Proof, query: &Query, claimed_value: &str) -> Result<(), VerificationFailure> {
        if proof.proof_type != self.proof_type {
            return Err(VerificationFailure::TypeMismatch {
                expected: self.proof_type,
                actual: proof.proof_type,
            });
        }
        if proof.evidence.is_empty() {
            return Err(VerificationFailure::EmptyEvidence);
        }

        let evidence: TranscriptEvidence = serde_json::from_slice(&proof.evidence)
            .map_err(|e| VerificationFailure::MalformedEvidence(e.to_string()))?;

        let digest = sha256(evidence.transcript.as_bytes());
        if hex::encode(digest) != evidence.digest.to_lowercase() {
            return Err(VerificationFailure::DigestMismatch);
        }
        if !self.trusted_notaries.contains(&evidence.notary) {
            return Err(VerificationFailure::UntrustedSigner(evidence.notary));
        }
        evidence
            .notary
            .verify(&digest, &evidence.signature)
            .map_err(|_| VerificationFailure::BadSignature)?;

        let selector = JsonSelector::parse(&query.expression)?;
        if !evidence.head().contains(selector.url) {
            return Err(VerificationFailure::SourceNotInTranscript);
        }
        let document: Value = serde_json::from_str(evidence.body().trim())
            .map_err(|e| VerificationFailure::MalformedEvidence(format!("response body: {}", e)))?;
        match selector.select(&document) {
            Some(selected) if scalar_matches(selected, claimed_value) => Ok(()),
            _ => Err(VerificationFailure::ValueNotInTranscript),
        }
    }
}

impl ProofVerifier for SignedTranscriptVerifier {
    fn name(&self) -> &str {
        "signed-transcript"
    }

    fn proof_type(&self) -> ProofType {
        self.proof_type
    }

    fn verify(&self, proof: &Proof, query: &Query, claimed_value: &str) -> VerificationResult {
        match self.check(proof, query, claimed_value) {
            Ok(()) => VerificationResult::success(self.name()),
            Err(failure) => VerificationResult::failure(self.name(), failure),
        }
    }
}

/// Verifier with a fixed verdict, for development and tests
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    proof_type: ProofType,
    verdict: Option<String>,
}

impl StaticVerifier {
    /// Accept every proof of `proof_type`
    pub fn accepting(proof_type: ProofType) -> Self {
        Self {
            proof_type,
            verdict: None,
        }
    }

    /// Reject every proof of `proof_type` with `reason`
    pub fn rejecting(proof_type: ProofType, reason: impl Into<String>) -> Self {
        Self {
            proof_type,
            verdict: Some(reason.into()),
        }
    }
}

impl ProofVerifier for StaticVerifier {
    fn name(&self) -> &str {
        "static"
    }

    fn proof_type(&self) -> ProofType {
        self.proof_type
    }

    fn verify(&self, proof: &Proof, _query: &Query, _claimed_value: &str) -> VerificationResult {
        if proof.proof_type != self.proof_type {
            return VerificationResult::failure(
                self.name(),
                VerificationFailure::TypeMismatch {
                    expected: self.proof_type,
                    actual: proof.proof_type,
                },
            );
        }
        match &self.verdict {
            None => VerificationResult::success(self.name()),
            Some(reason) => VerificationResult::failure(self.name(), VerificationFailure::Rejected(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKER: &str = "json(https://www.therocktrading.com/api/ticker/BTCEUR).result.0.last";
    const TRANSCRIPT: &str = "GET https://www.therocktrading.com/api/ticker/BTCEUR HTTP/1.1\r\nHTTP/1.1 200 OK\r\n\r\n{\"result\":[{\"last\":25000.12,\"volume\":\"12\"}]}";

    fn ticker() -> Query {
        Query::new("URL", TICKER, ProofType::TlsNotary)
    }

    fn transport_notary() -> KeyPair {
        KeyPair::from_seed([21u8; 32])
    }

    fn tls_proof(evidence: &TranscriptEvidence) -> Proof {
        Proof::new(ProofType::TlsNotary, evidence.to_evidence().unwrap())
    }

    fn verifier() -> SignedTranscriptVerifier {
        SignedTranscriptVerifier::new(ProofType::TlsNotary, [transport_notary().public_key()])
    }

    #[test]
    fn test_valid_transcript_verifies() {
        let evidence = TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary());
        let result = verifier().verify(&tls_proof(&evidence), &ticker(), "25000.12");
        assert!(result.is_valid(), "{:?}", result);
        assert_eq!(result.method, "signed-transcript");
    }

    #[test]
    fn test_verification_is_deterministic() {
        let proof = tls_proof(&TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary()));
        assert_eq!(verifier().verify(&proof, &ticker(), "25000.12"), verifier().verify(&proof, &ticker(), "25000.12"));
    }

    #[test]
    fn test_value_must_appear_in_transcript() {
        let proof = tls_proof(&TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary()));
        let result = verifier().verify(&proof, &ticker(), "31000.00");
        assert_eq!(result.failure, Some(VerificationFailure::ValueNotInTranscript));
    }

    #[test]
    fn test_value_must_be_the_selected_field() {
        let proof = tls_proof(&TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary()));
        for partial in ["5000.1", "2", "result", "last", "12"] {
            let result = verifier().verify(&proof, &ticker(), partial);
            assert_eq!(result.failure, Some(VerificationFailure::ValueNotInTranscript), "{}", partial);
        }
        assert!(verifier().verify(&proof, &ticker(), "25000.120").is_valid());

        let volume = Query::new("URL", TICKER.replace(".last", ".volume"), ProofType::TlsNotary);
        assert!(verifier().verify(&proof, &volume, "12").is_valid());
        assert!(!verifier().verify(&proof, &volume, "25000.12").is_valid());
    }

    #[test]
    fn test_transcript_must_request_queried_source() {
        let proof = tls_proof(&TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary()));
        let other = Query::new("URL", "json(https://prices.example.org/btc).result.0.last", ProofType::TlsNotary);
        let result = verifier().verify(&proof, &other, "25000.12");
        assert_eq!(result.failure, Some(VerificationFailure::SourceNotInTranscript));
    }

    #[test]
    fn test_unsupported_expression() {
        let proof = tls_proof(&TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary()));
        for expression in ["xml(https://x).a", "json()", "json(https://x)result", "json(https://x).a..b"] {
            let query = Query::new("URL", expression, ProofType::TlsNotary);
            assert!(matches!(
                verifier().verify(&proof, &query, "25000.12").failure,
                Some(VerificationFailure::UnsupportedExpression(_))
            ));
        }
    }

    #[test]
    fn test_tampered_transcript_rejected() {
        let mut evidence = TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary());
        evidence.transcript = evidence.transcript.replace("25000.12", "99999.99");
        let result = verifier().verify(&tls_proof(&evidence), &ticker(), "99999.99");
        assert_eq!(result.failure, Some(VerificationFailure::DigestMismatch));
    }

    #[test]
    fn test_untrusted_notary_rejected() {
        let rogue = KeyPair::from_seed([66u8; 32]);
        let evidence = TranscriptEvidence::notarize(TRANSCRIPT, &rogue);
        let result = verifier().verify(&tls_proof(&evidence), &ticker(), "25000.12");
        assert_eq!(result.failure, Some(VerificationFailure::UntrustedSigner(rogue.public_key())));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let mut evidence = TranscriptEvidence::notarize(TRANSCRIPT, &transport_notary());
        evidence.signature = KeyPair::from_seed([66u8; 32]).sign(b"something else");
        let result = verifier().verify(&tls_proof(&evidence), &ticker(), "25000.12");
        assert_eq!(result.failure, Some(VerificationFailure::BadSignature));
    }

    #[test]
    fn test_empty_and_malformed_evidence() {
        let empty = Proof::new(ProofType::TlsNotary, Vec::new());
        assert_eq!(verifier().verify(&empty, &ticker(), "1").failure, Some(VerificationFailure::EmptyEvidence));

        let garbage = Proof::new(ProofType::TlsNotary, b"not json".to_vec());
        assert!(matches!(
            verifier().verify(&garbage, &ticker(), "1").failure,
            Some(VerificationFailure::MalformedEvidence(_))
        ));
    }

    #[test]
    fn test_registry_routes_by_type() {
        let registry = ProofVerifierRegistry::new()
            .with_verifier(Arc::new(verifier()))
            .with_verifier(Arc::new(StaticVerifier::rejecting(ProofType::Android, "attestation revoked")));

        assert!(registry.supports(ProofType::TlsNotary));
        assert!(!registry.supports(ProofType::Ledger));

        let android = Proof::new(ProofType::Android, vec![1]);
        assert!(!registry.verify(&android, &ticker(), "1").is_valid());

        let ledger = Proof::new(ProofType::Ledger, vec![1]);
        assert_eq!(
            registry.verify(&ledger, &ticker(), "1").failure,
            Some(VerificationFailure::Unsupported(ProofType::Ledger))
        );
    }

    #[test]
    fn test_answer_must_use_requested_proof_type() {
        let oracle = KeyPair::from_seed([3u8; 32]).public_key();
        let registry = ProofVerifierRegistry::new()
            .with_verifier(Arc::new(StaticVerifier::accepting(ProofType::Native)));
        let query = Query::new("URL", "json(https://example.org).price", ProofType::TlsNotary);
        let answer = Answer::new("1.0", Proof::new(ProofType::Native, vec![1]), oracle);

        assert_eq!(
            registry.verify_answer(&query, &answer).failure,
            Some(VerificationFailure::TypeMismatch {
                expected: ProofType::TlsNotary,
                actual: ProofType::Native,
            })
        );
    }
}
