// Component commitments
//
// nonce = blake3("attest/nonce" | salt | group | index)
// leaf  = blake3("attest/leaf" | nonce | canonical bytes)
//
// Hidden components are represented by their leaf only; the nonce stays
// private so low-entropy contents cannot be guessed from the leaf.

use attest_crypto::{domain_hash, HashOutput};
use serde::Serialize;

use crate::component::ComponentGroup;
use crate::{LedgerError, LedgerResult};

const NONCE_DOMAIN: &str = "attest/nonce";
const LEAF_DOMAIN: &str = "attest/leaf";

/// Deterministic encoding used for every committed value
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> LedgerResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| LedgerError::EncodingError(e.to_string()))
}

/// Nonce of the component at `index` within `group`
pub fn component_nonce(salt: &[u8; 32], group: ComponentGroup, index: u32) -> HashOutput {
    domain_hash(
        NONCE_DOMAIN,
        &[salt, &group.tag().to_le_bytes(), &index.to_le_bytes()],
    )
}

/// Leaf hash committing to a component's encoded bytes
pub fn leaf_hash(nonce: &HashOutput, encoded: &[u8]) -> HashOutput {
    domain_hash(LEAF_DOMAIN, &[nonce.as_bytes(), encoded])
}
