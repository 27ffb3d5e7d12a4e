//! Round descriptors.
//!
//! A request identifies exactly one aggregation round and is immutable
//! once created. Signers answer it; the round key is derived from the
//! request's subject fields.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// A lender's request to aggregate interest accrued over a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRequest {
    /// Lender whose accrual is being priced.
    pub lender: Address,
    /// Window start (inclusive), Unix seconds.
    pub start_time: u64,
    /// Window end (inclusive), Unix seconds. Keys the round.
    pub end_time: u64,
    /// Requester-chosen round nonce.
    pub request_nonce: u64,
    /// When the request was created.
    pub request_time: u64,
}

/// A borrower's request for loan terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTermsRequest {
    /// Borrower the terms are for.
    pub borrower: Address,
    /// Where borrowed funds will be sent.
    pub recipient: Address,
    /// Requested principal, in lending-token base units.
    pub amount: u128,
    /// Requested duration in seconds.
    pub duration: u64,
    /// Requester-chosen round nonce.
    pub request_nonce: u64,
    /// When the request was created.
    pub request_time: u64,
}
