// In-process oracle service
//
// Answers queries from a FactSource, seals every answer with the oracle key
// and remembers what it issued. A filtered transaction is counter-signed only
// if it verifies and reveals nothing but attestations of answers this oracle
// handed out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attest_crypto::{HashOutput, KeyPair, PublicKey};
use attest_error::{OracleError, OracleResult};
use attest_ledger::{Answer, FilteredTransaction, Proof, Query, TransactionSignature};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::client::{AnswerEnvelope, OracleTransport};
use crate::verifier::TranscriptEvidence;

/// Where an oracle obtains facts
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Resolve `query` to a value and the evidence backing it
    async fn fetch(&self, query: &Query) -> OracleResult<(String, Proof)>;
}

/// Serves a fixed value with a fixed proof
#[derive(Debug, Clone)]
pub struct StaticFactSource {
    value: String,
    proof: Proof,
}

impl StaticFactSource {
    /// Create a source answering every query with `value`
    pub fn new(value: impl Into<String>, proof: Proof) -> Self {
        Self {
            value: value.into(),
            proof,
        }
    }
}

#[async_trait]
impl FactSource for StaticFactSource {
    async fn fetch(&self, _query: &Query) -> OracleResult<(String, Proof)> {
        Ok((self.value.clone(), self.proof.clone()))
    }
}

/// Serves a value inside a transcript notarized by a transport notary
#[derive(Debug, Clone)]
pub struct NotarizedTranscriptSource {
    value: String,
    transport_notary: KeyPair,
}

impl NotarizedTranscriptSource {
    /// Create a source whose transcripts are signed by `transport_notary`
    pub fn new(value: impl Into<String>, transport_notary: KeyPair) -> Self {
        Self {
            value: value.into(),
            transport_notary,
        }
    }
}

#[async_trait]
impl FactSource for NotarizedTranscriptSource {
    async fn fetch(&self, query: &Query) -> OracleResult<(String, Proof)> {
        let transcript = format!(
            "{} {}\r\nHTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\r\n{{\"result\":[{{\"last\":{}}}]}}",
            query.datasource, query.expression, self.value
        );
        let evidence = TranscriptEvidence::notarize(transcript, &self.transport_notary);
        Ok((self.value.clone(), Proof::new(query.proof_type, evidence.to_evidence()?)))
    }
}

/// An oracle running in the same process as the flow
pub struct LocalOracleService {
    keys: KeyPair,
    facts: Arc<dyn FactSource>,
    issued: Mutex<HashSet<HashOutput>>,
    query_delay: Duration,
    sign_delay: Duration,
}

impl LocalOracleService {
    /// Create an oracle signing with `keys` and answering from `facts`
    pub fn new(keys: KeyPair, facts: Arc<dyn FactSource>) -> Self {
        Self {
            keys,
            facts,
            issued: Mutex::new(HashSet::new()),
            query_delay: Duration::ZERO,
            sign_delay: Duration::ZERO,
        }
    }

    /// Delay every answer by `delay`
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    /// Delay every counter-signature by `delay`
    pub fn with_sign_delay(mut self, delay: Duration) -> Self {
        self.sign_delay = delay;
        self
    }

    /// Key the oracle signs with
    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    /// Number of answers handed out so far
    pub fn issued_count(&self) -> usize {
        self.issued.lock().len()
    }

    fn check_view(&self, view: &FilteredTransaction) -> OracleResult<()> {
        view.verify()
            .map_err(|e| OracleError::refused(format!("filtered transaction does not verify: {}", e)))?;

        let oracle = self.keys.public_key();
        let commands = view.revealed_commands();
        if commands.is_empty() {
            return Err(OracleError::refused("no attestation command revealed"));
        }

        let issued = self.issued.lock();
        for command in commands {
            let answer: &Answer = command
                .answer()
                .ok_or_else(|| OracleError::refused("revealed command is not an attestation"))?;
            if !command.requires(&oracle) {
                return Err(OracleError::refused("attestation does not require the oracle's signature"));
            }
            if answer.attester != oracle || !issued.contains(&answer.digest()?) {
                return Err(OracleError::refused(format!(
                    "answer {} was not issued by this oracle",
                    answer.value
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OracleTransport for LocalOracleService {
    async fn query(&self, query: &Query) -> OracleResult<AnswerEnvelope> {
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }

        let (value, proof) = self.facts.fetch(query).await?;
        let answer = Answer::new(value, proof, self.keys.public_key());
        self.issued.lock().insert(answer.digest()?);

        info!(
            expression = %query.expression,
            value = %answer.value,
            proof_type = %answer.proof.proof_type,
            "Oracle answered query"
        );
        AnswerEnvelope::seal(answer, &self.keys)
    }

    async fn sign(&self, view: &FilteredTransaction) -> OracleResult<TransactionSignature> {
        if !self.sign_delay.is_zero() {
            tokio::time::sleep(self.sign_delay).await;
        }

        if let Err(e) = self.check_view(view) {
            warn!(id = %view.id(), error = %e, "Oracle refused to sign");
            return Err(e);
        }

        debug!(id = %view.id(), hidden = view.hidden_count(), "Oracle signing filtered transaction");
        Ok(TransactionSignature::sign(&self.keys, &view.id()))
    }
}

impl std::fmt::Debug for LocalOracleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalOracleService")
            .field("public_key", &self.keys.public_key())
            .field("issued", &self.issued_count())
            .finish_non_exhaustive()
    }
}
