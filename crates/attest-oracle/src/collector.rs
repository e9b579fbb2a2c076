// Counter-signature collection

use std::sync::Arc;
use std::time::Duration;

use attest_error::{OracleError, OracleResult};
use attest_ledger::{FilteredTransaction, SignatureSet, TransactionSignature};
use tracing::{debug, warn};

use crate::client::{timeout_error, OracleTransport};
use crate::identity::OracleIdentity;

/// Obtains the oracle's signature over a filtered transaction
#[derive(Clone)]
pub struct SignatureCollector {
    identity: Arc<OracleIdentity>,
    transport: Arc<dyn OracleTransport>,
    timeout: Duration,
}

impl SignatureCollector {
    /// Create a collector for `identity` reached through `transport`
    pub fn new(identity: Arc<OracleIdentity>, transport: Arc<dyn OracleTransport>, timeout: Duration) -> Self {
        Self {
            identity,
            transport,
            timeout,
        }
    }

    /// Send `view` to the oracle and wait for its signature.
    ///
    /// The returned signature must be by the configured oracle key and must
    /// verify against the id the view commits to.
    pub async fn request_counter_signature(&self, view: &FilteredTransaction) -> OracleResult<TransactionSignature> {
        debug!(id = %view.id(), oracle = %self.identity, "Requesting oracle counter-signature");

        let signature = tokio::time::timeout(self.timeout, self.transport.sign(view))
            .await
            .map_err(|_| timeout_error(self.timeout))??;

        if signature.by != self.identity.public_key {
            return Err(OracleError::IdentityMismatch {
                expected: self.identity.public_key.to_hex(),
                actual: signature.by.to_hex(),
            });
        }
        if signature.verify(&view.id()).is_err() {
            warn!(id = %view.id(), "Oracle signature does not cover the filtered transaction");
            return Err(OracleError::refused(format!(
                "signature does not verify against {}",
                view.id()
            )));
        }

        debug!(id = %view.id(), "Oracle counter-signed");
        Ok(signature)
    }
}

/// Merge the initiator's and the oracle's signatures
pub fn combine(initiator: TransactionSignature, oracle: TransactionSignature) -> SignatureSet {
    SignatureSet::new().with(initiator).with(oracle)
}

impl std::fmt::Debug for SignatureCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureCollector")
            .field("identity", &self.identity)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
