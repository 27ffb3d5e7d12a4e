//! # cl-01-consensus
//!
//! Signer-quorum consensus for CreditLine.
//!
//! ## Architecture
//!
//! Off-chain signers independently price a request (interest accrual or
//! loan terms) and return signed responses. This subsystem reconciles
//! those responses into a single accepted result:
//!
//! ```text
//! borrower/lender ──request──→ [signers] ──signed responses──→
//!     submit / process_request ──→ accumulator ──quorum+tolerance──→ result
//! ```
//!
//! Replay is resisted three ways: domain separation (consumer identity +
//! chain identity mixed into every digest), a permanent per-signer nonce
//! registry, and per-round duplicate-submission tracking. Staleness is
//! bounded by a response expiry window; outlier manipulation by a
//! basis-point tolerance band around the round average.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let deps = ConsensusDeps::new(domain, settings, clock, signers);
//! let terms = LoanTermsConsensus::new(deps.clone());
//!
//! // Batch origination path
//! let finalized = terms.process_request(&request, &responses)?;
//! ```

pub mod domain;
pub mod service;
pub mod state;

// Re-export main types
pub use domain::{
    ConsensusError, ConsensusResult, FinalizedTerms, InterestRequest, InterestResponse,
    LoanTermsRequest, LoanTermsResponse, NumericSubmissions, SignatureDomain, SignerSet,
};
pub use service::{ConsensusDeps, InterestConsensus, LoanTermsConsensus, SubmitOutcome};
pub use state::ConsensusState;
