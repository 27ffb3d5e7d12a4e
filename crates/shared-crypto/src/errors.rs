//! Error types for cryptographic operations.

use shared_types::Address;
use thiserror::Error;

/// Errors raised by hashing and signature operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// R or S component outside the valid scalar range [1, n-1].
    #[error("Signature scalar out of range")]
    InvalidScalar,

    /// S component in the upper half of the curve order (EIP-2).
    #[error("Malleable signature: S not in lower half order")]
    MalleableSignature,

    /// Recovery id outside {0, 1, 27, 28}.
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Public key recovery failed for the given hash and signature.
    #[error("Signer recovery failed")]
    RecoveryFailed,

    /// Secret key bytes do not form a valid signing key.
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Low-level signing failure.
    #[error("Signing failed")]
    SigningFailed,

    /// Recovered signer differs from the expected identity.
    #[error("Signer mismatch: expected {expected:?}, recovered {recovered:?}")]
    SignerMismatch {
        /// The identity the caller required.
        expected: Address,
        /// The identity actually recovered from the signature.
        recovered: Address,
    },
}
