// Commit-specific error types
// Raised while finalizing a signed transaction through the notary

use thiserror::Error;
use crate::{AttestError, CryptoError, ErrorCode, ErrorDomain, ErrorKind, LedgerError};

/// Commit-specific error codes
pub mod codes {
    use crate::ErrorCode;

    // Notary error codes start with 6000
    pub const REJECTED: ErrorCode = ErrorCode(6001);
    pub const UNREACHABLE: ErrorCode = ErrorCode(6002);
    pub const TIMEOUT: ErrorCode = ErrorCode(6003);
    pub const BAD_NOTARY_SIGNATURE: ErrorCode = ErrorCode(6004);
    pub const LEDGER_ERROR: ErrorCode = ErrorCode(6005);
    pub const CRYPTO_ERROR: ErrorCode = ErrorCode(6006);
}

/// Commit-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// The notary refused the transaction
    #[error("Notarization rejected: {reason}")]
    Rejected { reason: String },

    /// The notary could not be contacted
    #[error("Notary unreachable: {0}")]
    Unreachable(String),

    /// The notary did not answer in time
    #[error("Notary did not respond within {after_ms} ms")]
    Timeout { after_ms: u64 },

    /// The notary's signature does not match its identity or the transaction
    #[error("Notary signature invalid: {0}")]
    BadNotarySignature(String),

    /// Local pre-commit checks failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Underlying crypto failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl AttestError for CommitError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            CommitError::Rejected { .. } => REJECTED,
            CommitError::Unreachable(_) => UNREACHABLE,
            CommitError::Timeout { .. } => TIMEOUT,
            CommitError::BadNotarySignature(_) => BAD_NOTARY_SIGNATURE,
            CommitError::Ledger(_) => LEDGER_ERROR,
            CommitError::Crypto(_) => CRYPTO_ERROR,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Notary
    }

    fn kind(&self) -> ErrorKind {
        match self {
            CommitError::Rejected { .. }
            | CommitError::Unreachable(_)
            | CommitError::Timeout { .. }
            | CommitError::BadNotarySignature(_) => ErrorKind::NotarizationRejected,
            CommitError::Ledger(inner) => inner.kind(),
            CommitError::Crypto(inner) => inner.kind(),
        }
    }
}

/// Convenient Result type for commit operations
pub type CommitResult<T> = Result<T, CommitError>;
