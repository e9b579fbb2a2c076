// Ledger-specific error types
// Raised while assembling, verifying, filtering and signing transactions

use thiserror::Error;
use crate::{AttestError, CryptoError, ErrorCode, ErrorDomain, ErrorKind};

/// Ledger-specific error codes
pub mod codes {
    use crate::ErrorCode;

    // Ledger error codes start with 4000
    pub const CONTRACT_VIOLATION: ErrorCode = ErrorCode(4001);
    pub const MALFORMED_TRANSACTION: ErrorCode = ErrorCode(4002);
    pub const DISCLOSURE_INCONSISTENT: ErrorCode = ErrorCode(4003);
    pub const INCOMPLETE_SIGNATURES: ErrorCode = ErrorCode(4004);
    pub const INVALID_SIGNATURE: ErrorCode = ErrorCode(4005);
    pub const ENCODING_ERROR: ErrorCode = ErrorCode(4006);
    pub const CRYPTO_ERROR: ErrorCode = ErrorCode(4007);
}

/// Ledger-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A governing contract rejected the transaction
    #[error("Contract {contract} rejected the transaction: {reason}")]
    ContractViolation { contract: String, reason: String },

    /// Structural invariant of the transaction does not hold
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    /// A filtered view could not be produced or does not match its commitment
    #[error("Disclosure inconsistent: {0}")]
    DisclosureInconsistent(String),

    /// Required signers without a signature
    #[error("Missing signatures from: {}", missing.join(", "))]
    IncompleteSignatures { missing: Vec<String> },

    /// A signature in the set does not verify against the transaction id
    #[error("Signature by {signer} does not verify against the transaction id")]
    InvalidSignature { signer: String },

    /// Canonical encoding failed
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Underlying crypto failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl AttestError for LedgerError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            LedgerError::ContractViolation { .. } => CONTRACT_VIOLATION,
            LedgerError::MalformedTransaction(_) => MALFORMED_TRANSACTION,
            LedgerError::DisclosureInconsistent(_) => DISCLOSURE_INCONSISTENT,
            LedgerError::IncompleteSignatures { .. } => INCOMPLETE_SIGNATURES,
            LedgerError::InvalidSignature { .. } => INVALID_SIGNATURE,
            LedgerError::EncodingError(_) => ENCODING_ERROR,
            LedgerError::Crypto(_) => CRYPTO_ERROR,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Ledger
    }

    fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ContractViolation { .. } | LedgerError::MalformedTransaction(_) => {
                ErrorKind::ContractViolation
            }
            LedgerError::DisclosureInconsistent(_) => ErrorKind::DisclosureInconsistent,
            LedgerError::IncompleteSignatures { .. } | LedgerError::InvalidSignature { .. } => {
                ErrorKind::IncompleteSignatures
            }
            LedgerError::EncodingError(_) | LedgerError::Crypto(_) => ErrorKind::Internal,
        }
    }
}

/// Convenient Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Create a new contract violation
    pub fn contract_violation(contract: impl Into<String>, reason: impl Into<String>) -> Self {
        LedgerError::ContractViolation {
            contract: contract.into(),
            reason: reason.into(),
        }
    }

    /// Create a new malformed transaction error
    pub fn malformed(message: impl Into<String>) -> Self {
        LedgerError::MalformedTransaction(message.into())
    }

    /// Create a new disclosure error
    pub fn disclosure(message: impl Into<String>) -> Self {
        LedgerError::DisclosureInconsistent(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_kinds() {
        assert_eq!(
            LedgerError::contract_violation("cash", "amount must be positive").kind(),
            ErrorKind::ContractViolation
        );
        assert_eq!(LedgerError::malformed("no commands").kind(), ErrorKind::ContractViolation);
        assert_eq!(LedgerError::disclosure("root mismatch").kind(), ErrorKind::DisclosureInconsistent);
        assert_eq!(
            LedgerError::InvalidSignature { signer: "ab".into() }.kind(),
            ErrorKind::IncompleteSignatures
        );
    }

    #[test]
    fn test_incomplete_signatures_message() {
        let err = LedgerError::IncompleteSignatures {
            missing: vec!["aa".to_string(), "bb".to_string()],
        };
        assert_eq!(err.to_string(), "Missing signatures from: aa, bb");
        assert_eq!(err.code(), codes::INCOMPLETE_SIGNATURES);
    }
}
