//! Error types for the consensus subsystem.

use shared_types::{Address, U256};

/// Consensus error types.
///
/// Each variant is a stable failure reason consumed directly by calling
/// code and tests; every failure leaves the round state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    /// Caller may not perform this operation.
    #[error("Unauthorized caller: {0:?}")]
    Unauthorized(Address),

    /// Response signer is not in the active signer set.
    #[error("Unknown signer: {0:?}")]
    UnknownSigner(Address),

    /// No open round matches the request.
    #[error("No open request for this round")]
    NotRequested,

    /// A round for this subject is already open.
    #[error("Round already requested")]
    AlreadyRequested,

    /// The round has already produced its result.
    #[error("Round already finalized")]
    AlreadyFinalized,

    /// This signer has already submitted for the round.
    #[error("Signer already submitted: {0:?}")]
    AlreadySubmitted(Address),

    /// The (signer, nonce) pair was consumed by an earlier round.
    #[error("Nonce {nonce} already taken for signer {signer:?}")]
    NonceTaken { signer: Address, nonce: u64 },

    /// The response is older than the expiry window.
    #[error("Response expired: age {age}s exceeds {limit}s")]
    ResponseExpired { age: u64, limit: u64 },

    /// Signature did not recover to the claimed signer.
    #[error("Signature not valid for signer {0:?}")]
    SignatureNotValid(Address),

    /// An extreme deviates from the round average beyond tolerance.
    #[error("Responses too varied: deviation {deviation} exceeds {allowed} around average {average}")]
    ResponsesTooVaried {
        average: U256,
        deviation: U256,
        allowed: U256,
    },

    /// Batch shorter than the required quorum.
    #[error("Insufficient responses: got {got}, required {required}")]
    InsufficientResponses { got: usize, required: usize },

    /// Borrower asked for new terms too soon after the previous request.
    #[error("Terms request rate limited: {elapsed}s elapsed of {limit}s")]
    RequestRateLimited { elapsed: u64, limit: u64 },

    /// Requested duration exceeds the platform maximum.
    #[error("Duration {duration}s exceeds maximum {max}s")]
    DurationExceedsMaximum { duration: u64, max: u64 },

    /// Structurally invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
