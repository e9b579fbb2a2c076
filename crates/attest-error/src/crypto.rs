// Crypto-specific error types
// These errors are specifically for the attest-crypto crate

use thiserror::Error;
use crate::{AttestError, ErrorCode, ErrorDomain, ErrorKind};

/// Crypto-specific error codes
pub mod codes {
    use crate::ErrorCode;

    // Crypto error codes start with 3000
    pub const KEY_ERROR: ErrorCode = ErrorCode(3001);
    pub const SIGNATURE_ERROR: ErrorCode = ErrorCode(3002);
    pub const LENGTH_ERROR: ErrorCode = ErrorCode(3003);
    pub const ENCODING_ERROR: ErrorCode = ErrorCode(3004);
    pub const COMMITMENT_ERROR: ErrorCode = ErrorCode(3005);
}

/// Crypto-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Bytes do not form a valid Ed25519 public key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature did not verify
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Fixed-size value decoded with the wrong length
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Commitment over zero leaves
    #[error("Cannot build a commitment over an empty leaf set")]
    EmptyCommitment,
}

impl AttestError for CryptoError {
    fn code(&self) -> ErrorCode {
        use codes::*;
        match self {
            CryptoError::InvalidPublicKey(_) => KEY_ERROR,
            CryptoError::InvalidSignature(_) => SIGNATURE_ERROR,
            CryptoError::InvalidLength { .. } => LENGTH_ERROR,
            CryptoError::EncodingError(_) => ENCODING_ERROR,
            CryptoError::EmptyCommitment => COMMITMENT_ERROR,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Crypto
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Convenient Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

// Helper methods for creating crypto errors
impl CryptoError {
    /// Create a new encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        CryptoError::EncodingError(message.into())
    }

    /// Create a new signature error
    pub fn signature(message: impl Into<String>) -> Self {
        CryptoError::InvalidSignature(message.into())
    }
}
