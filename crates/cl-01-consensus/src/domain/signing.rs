//! Domain-separated request and response hashing.
//!
//! Every digest binds the payload to the consuming instance and the
//! execution chain, so a signed response can never be replayed against a
//! different deployment or fork. A distinct tag byte per payload kind
//! keeps request and response digests from colliding structurally.

use super::{InterestRequest, InterestResponse, LoanTermsRequest, LoanTermsResponse};
use serde::{Deserialize, Serialize};
use shared_crypto::Keccak256Hasher;
use shared_types::{Address, Hash};

const TAG_INTEREST_REQUEST: u8 = 0x01;
const TAG_LOAN_TERMS_REQUEST: u8 = 0x02;
const TAG_INTEREST_RESPONSE: u8 = 0x03;
const TAG_LOAN_TERMS_RESPONSE: u8 = 0x04;

/// The replay-separation context: which instance is consuming the
/// payload, on which chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDomain {
    /// Execution-chain identifier.
    pub chain_id: u64,
    /// Identity of the consuming instance.
    pub consumer: Address,
}

impl SignatureDomain {
    /// Create a domain for one consuming instance on one chain.
    pub fn new(chain_id: u64, consumer: Address) -> Self {
        Self { chain_id, consumer }
    }

    fn seeded(&self, tag: u8) -> Keccak256Hasher {
        let mut hasher = Keccak256Hasher::new();
        hasher
            .update(&self.consumer)
            .update(&self.chain_id.to_le_bytes())
            .update(&[tag]);
        hasher
    }

    /// Digest of an interest request.
    pub fn hash_interest_request(&self, request: &InterestRequest) -> Hash {
        let mut hasher = self.seeded(TAG_INTEREST_REQUEST);
        hasher
            .update(&request.lender)
            .update(&request.start_time.to_le_bytes())
            .update(&request.end_time.to_le_bytes())
            .update(&request.request_nonce.to_le_bytes())
            .update(&request.request_time.to_le_bytes());
        hasher.finalize()
    }

    /// Digest of a loan-terms request.
    pub fn hash_loan_terms_request(&self, request: &LoanTermsRequest) -> Hash {
        let mut hasher = self.seeded(TAG_LOAN_TERMS_REQUEST);
        hasher
            .update(&request.borrower)
            .update(&request.recipient)
            .update(&request.amount.to_le_bytes())
            .update(&request.duration.to_le_bytes())
            .update(&request.request_nonce.to_le_bytes())
            .update(&request.request_time.to_le_bytes());
        hasher.finalize()
    }

    /// Digest of an interest response, bound to its request digest.
    pub fn hash_interest_response(
        &self,
        request_hash: &Hash,
        response: &InterestResponse,
    ) -> Hash {
        let mut interest = [0u8; 32];
        response.interest.to_big_endian(&mut interest);

        let mut hasher = self.seeded(TAG_INTEREST_RESPONSE);
        hasher
            .update(request_hash)
            .update(&response.signer)
            .update(&response.nonce.to_le_bytes())
            .update(&response.response_time.to_le_bytes())
            .update(&interest);
        hasher.finalize()
    }

    /// Digest of a loan-terms response, bound to its request digest.
    pub fn hash_loan_terms_response(
        &self,
        request_hash: &Hash,
        response: &LoanTermsResponse,
    ) -> Hash {
        let mut hasher = self.seeded(TAG_LOAN_TERMS_RESPONSE);
        hasher
            .update(request_hash)
            .update(&response.signer)
            .update(&response.nonce.to_le_bytes())
            .update(&response.response_time.to_le_bytes())
            .update(&response.interest_rate.to_le_bytes())
            .update(&response.collateral_ratio.to_le_bytes())
            .update(&response.max_loan_amount.to_le_bytes());
        hasher.finalize()
    }
}
