// Attestation Error Handling Framework
// Central location for error types, codes and the protocol error kinds

use std::error::Error as StdError;
use std::fmt;

// Re-export common error handling tools for convenience
pub use thiserror;

mod commit;
mod crypto;
mod ledger;
mod oracle;

pub use commit::{CommitError, CommitResult};
pub use crypto::{CryptoError, CryptoResult};
pub use ledger::{LedgerError, LedgerResult};
pub use oracle::{OracleError, OracleResult};

/// Error domains representing different components of the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorDomain {
    Crypto, Ledger, Oracle, Notary, Flow,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDomain::Crypto => write!(f, "crypto"),
            ErrorDomain::Ledger => write!(f, "ledger"),
            ErrorDomain::Oracle => write!(f, "oracle"),
            ErrorDomain::Notary => write!(f, "notary"),
            ErrorDomain::Flow => write!(f, "flow"),
        }
    }
}

/// Error code structure for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// The terminal failure kinds a protocol run can end with.
///
/// Every domain error maps onto exactly one kind. `Internal` covers encoding
/// and key-material failures that are not protocol outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    OracleUnreachable,
    OracleTimeout,
    ProofInvalid,
    IdentityMismatch,
    ContractViolation,
    DisclosureInconsistent,
    SignatureRefused,
    IncompleteSignatures,
    NotarizationRejected,
    Internal,
}

impl ErrorKind {
    /// Kinds for which restarting the whole run may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::OracleUnreachable | ErrorKind::OracleTimeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::OracleUnreachable => "OracleUnreachable",
            ErrorKind::OracleTimeout => "OracleTimeout",
            ErrorKind::ProofInvalid => "ProofInvalid",
            ErrorKind::IdentityMismatch => "IdentityMismatch",
            ErrorKind::ContractViolation => "ContractViolation",
            ErrorKind::DisclosureInconsistent => "DisclosureInconsistent",
            ErrorKind::SignatureRefused => "SignatureRefused",
            ErrorKind::IncompleteSignatures => "IncompleteSignatures",
            ErrorKind::NotarizationRejected => "NotarizationRejected",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Base trait for all errors raised by the attestation protocol.
pub trait AttestError: StdError + Send + Sync + 'static {
    /// Numeric code of this error
    fn code(&self) -> ErrorCode;

    /// Component domain this error originates from
    fn domain(&self) -> ErrorDomain;

    /// Protocol failure kind
    fn kind(&self) -> ErrorKind;

    /// Indicates if restarting the run might succeed
    fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode(7).to_string(), "0007");
        assert_eq!(ErrorCode(4102).to_string(), "4102");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::OracleUnreachable.is_transient());
        assert!(ErrorKind::OracleTimeout.is_transient());
        assert!(!ErrorKind::ProofInvalid.is_transient());
        assert!(!ErrorKind::NotarizationRejected.is_transient());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::OracleTimeout).unwrap();
        assert_eq!(json, "\"ORACLE_TIMEOUT\"");

        let err = OracleError::Timeout { after_ms: 250 };
        assert_eq!(err.domain(), ErrorDomain::Oracle);
        assert_eq!(err.kind(), ErrorKind::OracleTimeout);
    }
}
