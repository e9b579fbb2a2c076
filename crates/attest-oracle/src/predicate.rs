// Default disclosure rule for oracle counter-signing

use attest_crypto::PublicKey;
use attest_error::LedgerResult;
use attest_ledger::{Component, DisclosurePredicate};

/// Reveals to the oracle only the attestation commands it must sign.
///
/// A command is revealed when it carries an oracle answer and lists the viewer
/// among its signers. The notary, outputs and every other command stay hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDisclosure;

impl DisclosurePredicate for OracleDisclosure {
    fn reveal(&self, viewer: &PublicKey, component: &Component<'_>) -> LedgerResult<bool> {
        Ok(match component {
            Component::Command(command) => command.is_attestation() && command.requires(viewer),
            Component::Notary(_) | Component::Output(_) => false,
        })
    }
}
