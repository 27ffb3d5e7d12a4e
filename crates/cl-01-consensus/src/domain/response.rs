//! Signed signer responses and finalized round outputs.

use serde::{Deserialize, Serialize};
use shared_crypto::EcdsaSignature;
use shared_types::{Address, U256};

/// One signer's answer to an interest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestResponse {
    /// The responding signer.
    pub signer: Address,
    /// Signer's one-time nonce, consumed forever on acceptance.
    pub nonce: u64,
    /// When the signer computed the answer, Unix seconds.
    pub response_time: u64,
    /// Accrued interest for the requested window.
    pub interest: U256,
    /// Signature over the domain-separated response digest.
    pub signature: EcdsaSignature,
}

/// One signer's answer to a loan-terms request.
///
/// The three values aggregate independently; all must agree within
/// tolerance for the round to finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTermsResponse {
    /// The responding signer.
    pub signer: Address,
    /// Signer's one-time nonce, consumed forever on acceptance.
    pub nonce: u64,
    /// When the signer computed the answer, Unix seconds.
    pub response_time: u64,
    /// Proposed yearly interest rate, basis points.
    pub interest_rate: u64,
    /// Proposed minimum collateral ratio, basis points.
    pub collateral_ratio: u64,
    /// Proposed maximum principal, lending-token base units.
    pub max_loan_amount: u128,
    /// Signature over the domain-separated response digest.
    pub signature: EcdsaSignature,
}

/// Accepted terms emitted by a finalized loan-terms round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTerms {
    /// Yearly interest rate, basis points.
    pub interest_rate: u64,
    /// Minimum collateral ratio, basis points.
    pub collateral_ratio: u64,
    /// Maximum principal, lending-token base units.
    pub max_loan_amount: u128,
}
