//! Error types for the price resolver.

use shared_types::{Address, Token};
use thiserror::Error;

/// Resolver error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Caller may not mutate the registry.
    #[error("Unauthorized registry caller: {0:?}")]
    Unauthorized(Address),

    /// Base or quote is the zero address, or base equals quote.
    #[error("Invalid pair: {0}")]
    InvalidPair(&'static str),

    /// Decimal configuration outside the supported range.
    #[error("Unsupported decimals: {0}")]
    InvalidDecimals(u32),

    /// The pair is already registered.
    #[error("Pair already registered: {base:?}/{quote:?}")]
    PairAlreadyRegistered { base: Token, quote: Token },

    /// No source registered for the pair.
    #[error("Pair not supported: {base:?}/{quote:?}")]
    PairNotSupported { base: Token, quote: Token },

    /// The source failed to produce a reading.
    #[error("Price source failure: {0}")]
    SourceFailure(String),

    /// The source produced a zero reading.
    #[error("Invalid price reading")]
    InvalidReading,

    /// Normalized value does not fit the output width.
    #[error("Normalized value overflows")]
    ValueOverflow,
}

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;
