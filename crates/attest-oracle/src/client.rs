// Client side of the oracle protocol
//
// The transport moves requests and responses; the ExternalFactOracle wraps a
// query in a bounded wait and checks that the answer really comes from the
// configured oracle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attest_crypto::{KeyPair, PublicKey, Signature};
use attest_error::{OracleError, OracleResult};
use attest_ledger::{Answer, FilteredTransaction, Proof, Query, TransactionSignature};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::identity::OracleIdentity;

/// Answer as it travels over the wire, signed by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    pub value: String,
    pub proof: Proof,
    pub attester: PublicKey,
    pub signature: Signature,
}

impl AnswerEnvelope {
    /// Sign an answer with the oracle's key
    pub fn seal(answer: Answer, keys: &KeyPair) -> OracleResult<Self> {
        let digest = answer.digest()?;
        Ok(Self {
            signature: keys.sign(digest.as_bytes()),
            value: answer.value,
            proof: answer.proof,
            attester: answer.attester,
        })
    }

    /// The answer without its envelope signature
    pub fn answer(&self) -> Answer {
        Answer::new(self.value.clone(), self.proof.clone(), self.attester)
    }
}

/// Channel to an oracle
#[async_trait]
pub trait OracleTransport: Send + Sync {
    /// Submit a query and wait for the signed answer
    async fn query(&self, query: &Query) -> OracleResult<AnswerEnvelope>;

    /// Ask the oracle to counter-sign a filtered transaction
    async fn sign(&self, view: &FilteredTransaction) -> OracleResult<TransactionSignature>;
}

/// Convert an elapsed bounded wait into the protocol timeout error
pub(crate) fn timeout_error(after: Duration) -> OracleError {
    OracleError::Timeout {
        after_ms: after.as_millis() as u64,
    }
}

/// Queries the configured oracle for a fact
#[derive(Clone)]
pub struct ExternalFactOracle {
    identity: Arc<OracleIdentity>,
    transport: Arc<dyn OracleTransport>,
    timeout: Duration,
}

impl ExternalFactOracle {
    /// Create a client for `identity` reached through `transport`
    pub fn new(identity: Arc<OracleIdentity>, transport: Arc<dyn OracleTransport>, timeout: Duration) -> Self {
        Self {
            identity,
            transport,
            timeout,
        }
    }

    /// The oracle this client talks to
    pub fn identity(&self) -> &OracleIdentity {
        &self.identity
    }

    /// Submit `query` and wait at most the configured time for the answer.
    ///
    /// The answer must be attested by the configured oracle key and the
    /// envelope signature must verify under that key.
    pub async fn query(&self, query: &Query) -> OracleResult<Answer> {
        debug!(
            oracle = %self.identity,
            datasource = %query.datasource,
            proof_type = %query.proof_type,
            "Querying oracle"
        );

        let envelope = tokio::time::timeout(self.timeout, self.transport.query(query))
            .await
            .map_err(|_| timeout_error(self.timeout))??;

        let expected = self.identity.public_key;
        if envelope.attester != expected {
            warn!(
                expected = %expected.short(),
                actual = %envelope.attester.short(),
                "Answer attested by unexpected key"
            );
            return Err(OracleError::IdentityMismatch {
                expected: expected.to_hex(),
                actual: envelope.attester.to_hex(),
            });
        }

        let answer = envelope.answer();
        let digest = answer.digest()?;
        if expected.verify(digest.as_bytes(), &envelope.signature).is_err() {
            return Err(OracleError::IdentityMismatch {
                expected: expected.to_hex(),
                actual: "unverifiable envelope signature".to_string(),
            });
        }

        debug!(value = %answer.value, "Received oracle answer");
        Ok(answer)
    }
}

impl std::fmt::Debug for ExternalFactOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalFactOracle")
            .field("identity", &self.identity)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
