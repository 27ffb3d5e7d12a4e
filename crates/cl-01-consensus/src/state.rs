//! Mutable state of the consensus subsystem.
//!
//! Rounds and their accumulators live only for one aggregation; the
//! nonce registry is permanent and only ever grows.

use crate::domain::{InterestRequest, NumericSubmissions};
use parking_lot::RwLock;
use shared_types::{Address, Hash, U256};
use std::collections::{HashMap, HashSet};

/// One open interest aggregation round.
#[derive(Debug, Clone)]
pub struct InterestRound {
    /// The immutable round descriptor.
    pub request: InterestRequest,
    /// Domain-separated digest of the descriptor.
    pub request_hash: Hash,
    /// Running accumulator for the proposed interest values.
    pub submissions: NumericSubmissions,
    /// Signers that already submitted this round.
    pub submitted: HashSet<Address>,
}

/// Encapsulates the mutable state of the consensus services: the
/// permanent nonce registry, open interest rounds and their finalized
/// results, and the per-borrower terms-request clock.
pub struct ConsensusState {
    /// `(signer, nonce)` pairs consumed forever.
    pub nonces: RwLock<HashSet<(Address, u64)>>,
    /// Open interest rounds keyed by `(lender, end_time)`.
    pub interest_rounds: RwLock<HashMap<(Address, u64), InterestRound>>,
    /// Finalized interest averages keyed by `(lender, end_time)`.
    pub interest_results: RwLock<HashMap<(Address, u64), U256>>,
    /// Per-borrower time of the last accepted terms request.
    pub last_terms_request: RwLock<HashMap<Address, u64>>,
}

impl ConsensusState {
    pub fn new() -> Self {
        Self {
            nonces: RwLock::new(HashSet::new()),
            interest_rounds: RwLock::new(HashMap::new()),
            interest_results: RwLock::new(HashMap::new()),
            last_terms_request: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `(signer, nonce)` was consumed by any earlier round.
    pub fn nonce_taken(&self, signer: &Address, nonce: u64) -> bool {
        self.nonces.read().contains(&(*signer, nonce))
    }

    /// Consume `(signer, nonce)` permanently.
    pub fn consume_nonce(&self, signer: Address, nonce: u64) {
        self.nonces.write().insert((signer, nonce));
    }

    /// Finalized interest average for a `(lender, end_time)` window.
    pub fn interest_result(&self, lender: &Address, end_time: u64) -> Option<U256> {
        self.interest_results.read().get(&(*lender, end_time)).copied()
    }
}

impl Default for ConsensusState {
    fn default() -> Self {
        Self::new()
    }
}
