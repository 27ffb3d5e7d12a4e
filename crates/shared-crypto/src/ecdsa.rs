//! # ECDSA Signer Recovery (secp256k1)
//!
//! Recoverable secp256k1 signatures standing in for authenticated
//! off-chain participants: a signer's identity is the last 20 bytes of
//! the Keccak-256 of its uncompressed public key, and verification means
//! recovering that identity from a signature over a 32-byte digest.
//!
//! ## Security Notes
//!
//! - R and S must be in [1, n-1]; checked in constant time via `subtle`
//! - S must be strictly below half the curve order (EIP-2)
//! - Recovery id accepted as 0, 1, 27, or 28

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, U256};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half the curve order, the EIP-2 malleability boundary.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// A recoverable ECDSA signature in r || s || v form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes, big-endian).
    pub r: [u8; 32],
    /// S component (32 bytes, big-endian), low-S normalized.
    pub s: [u8; 32],
    /// Recovery id: 0, 1, 27, or 28.
    pub v: u8,
}

/// Constant-time strict `a < b` over 32-byte big-endian values.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let undecided = !(less | greater);
        let byte_less = Choice::from((a[i] < b[i]) as u8);
        let byte_greater = Choice::from((a[i] > b[i]) as u8);
        less |= undecided & byte_less;
        greater |= undecided & byte_greater;
    }

    less.into()
}

/// Scalar is in [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }
    let nonzero: bool = (!is_zero).into();
    nonzero && ct_less_than(scalar, &SECP256K1_ORDER)
}

/// S is strictly below half the curve order.
fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER)
}

/// Map a v byte to a recovery id.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let byte = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };
    RecoveryId::from_byte(byte).ok_or(CryptoError::InvalidRecoveryId(v))
}

/// Compute `n - s`, turning a low-S signature component into its
/// malleable twin. Exposed for negative tests.
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let n = U256::from_big_endian(&SECP256K1_ORDER);
    let s_int = U256::from_big_endian(s);
    let mut out = [0u8; 32];
    n.saturating_sub(s_int).to_big_endian(&mut out);
    out
}

/// Derive a signer identity from a public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point prefix
    let digest = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

/// Validate a signature and recover the signer identity.
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, CryptoError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(CryptoError::InvalidScalar);
    }
    if !is_low_s(&signature.s) {
        return Err(CryptoError::MalleableSignature);
    }
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::InvalidScalar)?;
    sig_bytes.zeroize();

    let recovered = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_from_pubkey(&recovered))
}

/// Recover the signer and require it to match `expected`.
pub fn verify_signer(
    message_hash: &Hash,
    signature: &EcdsaSignature,
    expected: Address,
) -> Result<Address, CryptoError> {
    let recovered = recover_address(message_hash, signature)?;
    if recovered != expected {
        return Err(CryptoError::SignerMismatch {
            expected,
            recovered,
        });
    }
    Ok(recovered)
}

/// One item of a batch verification.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// Digest the signature covers.
    pub message_hash: Hash,
    /// The signature to check.
    pub signature: EcdsaSignature,
    /// When set, the recovered signer must match.
    pub expected_signer: Option<Address>,
}

/// Outcome of a batch verification.
#[derive(Debug, Clone)]
pub struct BatchVerification {
    /// Per-item outcome in input order.
    pub results: Vec<Result<Address, CryptoError>>,
    /// Number of valid items.
    pub valid_count: usize,
    /// Number of invalid items.
    pub invalid_count: usize,
}

impl BatchVerification {
    /// True when every item verified.
    pub fn all_valid(&self) -> bool {
        self.invalid_count == 0
    }
}

/// Verify a batch of signatures in parallel.
pub fn batch_verify(requests: &[VerificationRequest]) -> BatchVerification {
    let results: Vec<Result<Address, CryptoError>> = requests
        .par_iter()
        .map(|req| {
            let recovered = recover_address(&req.message_hash, &req.signature)?;
            match req.expected_signer {
                Some(expected) if expected != recovered => Err(CryptoError::SignerMismatch {
                    expected,
                    recovered,
                }),
                _ => Ok(recovered),
            }
        })
        .collect();

    let valid_count = results.iter().filter(|r| r.is_ok()).count();
    let invalid_count = results.len() - valid_count;
    BatchVerification {
        results,
        valid_count,
        invalid_count,
    }
}

/// A signing identity for off-chain quorum participants.
pub struct SignerKeyPair {
    signing_key: SigningKey,
}

impl SignerKeyPair {
    /// Generate a random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Restore a keypair from secret key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_bytes((&bytes).into())
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// The signer identity this key controls.
    pub fn address(&self) -> Address {
        address_from_pubkey(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest, normalizing to low-S form.
    pub fn sign_prehash(&self, message_hash: &Hash) -> Result<EcdsaSignature, CryptoError> {
        let (sig, recid) = self
            .signing_key
            .sign_prehash_recoverable(message_hash)
            .map_err(|_| CryptoError::SigningFailed)?;

        let (sig, recid) = match sig.normalize_s() {
            Some(normalized) => {
                let flipped = RecoveryId::from_byte(recid.to_byte() ^ 1)
                    .ok_or(CryptoError::SigningFailed)?;
                (normalized, flipped)
            }
            None => (sig, recid),
        };

        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(EcdsaSignature {
            r,
            s,
            v: recid.to_byte() + 27,
        })
    }

    /// Secret key bytes, for persistence.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for SignerKeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}
