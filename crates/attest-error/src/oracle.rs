// Oracle-specific error types
// Raised by the oracle client, the proof verifiers and the signature collector

use thiserror::Error;
use crate::{AttestError, CryptoError, ErrorCode, ErrorDomain, ErrorKind, LedgerError};

/// Oracle-specific error codes
pub mod codes {
    use crate::ErrorCode;

    // Oracle error codes start with 5000
    pub const UNREACHABLE: ErrorCode = ErrorCode(5001);
    pub const TIMEOUT: ErrorCode = ErrorCode(5002);
    pub const PROOF_INVALID: ErrorCode = ErrorCode(5003);
    pub const IDENTITY_MISMATCH: ErrorCode = ErrorCode(5004);
    pub const SIGNATURE_REFUSED: ErrorCode = ErrorCode(5005);
    pub const LEDGER_ERROR: ErrorCode = ErrorCode(5006);
    pub const CRYPTO_ERROR: ErrorCode = ErrorCode(5007);
}

/// Oracle-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle endpoint could not be reached or answered garbage
    #[error("Oracle unreachable: {0}")]
    Unreachable(String),

    /// The bounded wait at a suspension point elapsed
    #[error("Oracle did not respond within {after_ms} ms")]
    Timeout { after_ms: u64 },

    /// The answer's proof did not verify
    #[error("Proof of type {proof_type} is invalid: {reason}")]
    ProofInvalid { proof_type: String, reason: String },

    /// The responder is not the configured oracle
    #[error("Oracle identity mismatch: expected {expected}, got {actual}")]
    IdentityMismatch { expected: String, actual: String },

    /// The oracle declined to counter-sign
    #[error("Oracle refused to sign: {0}")]
    SignatureRefused(String),

    /// The filtered view handed to the oracle is unusable
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Underlying crypto failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl AttestError for OracleError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            OracleError::Unreachable(_) => UNREACHABLE,
            OracleError::Timeout { .. } => TIMEOUT,
            OracleError::ProofInvalid { .. } => PROOF_INVALID,
            OracleError::IdentityMismatch { .. } => IDENTITY_MISMATCH,
            OracleError::SignatureRefused(_) => SIGNATURE_REFUSED,
            OracleError::Ledger(_) => LEDGER_ERROR,
            OracleError::Crypto(_) => CRYPTO_ERROR,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Oracle
    }

    fn kind(&self) -> ErrorKind {
        match self {
            OracleError::Unreachable(_) => ErrorKind::OracleUnreachable,
            OracleError::Timeout { .. } => ErrorKind::OracleTimeout,
            OracleError::ProofInvalid { .. } => ErrorKind::ProofInvalid,
            OracleError::IdentityMismatch { .. } => ErrorKind::IdentityMismatch,
            OracleError::SignatureRefused(_) => ErrorKind::SignatureRefused,
            OracleError::Ledger(inner) => inner.kind(),
            OracleError::Crypto(inner) => inner.kind(),
        }
    }
}

/// Convenient Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;

impl OracleError {
    /// Create a new unreachable error
    pub fn unreachable(message: impl Into<String>) -> Self {
        OracleError::Unreachable(message.into())
    }

    /// Create a new refusal
    pub fn refused(message: impl Into<String>) -> Self {
        OracleError::SignatureRefused(message.into())
    }
}
