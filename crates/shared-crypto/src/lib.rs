//! # Shared Crypto - Signer Identity Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Domain-separated request/response hashing |
//! | `ecdsa` | secp256k1 | Signer recovery and quorum membership checks |
//!
//! ## Security Properties
//!
//! - Strict low-S signatures (EIP-2 malleability protection)
//! - Scalar range validation in constant time (`subtle`)
//! - RFC 6979 deterministic signing, no RNG dependency at sign time
//! - Secret key material zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    batch_verify, recover_address, verify_signer, BatchVerification, EcdsaSignature,
    SignerKeyPair, VerificationRequest,
};
pub use errors::CryptoError;
pub use hashing::{keccak256, Keccak256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
