//! Error types for the loan ledger.

use super::LoanStatus;
use cl_01_consensus::ConsensusError;
use cl_02_price_resolver::ResolverError;
use shared_types::{Address, Token, U256};
use thiserror::Error;

/// Ledger error types.
///
/// Every failure is atomic: no partially-applied state survives a
/// returned error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Caller may not perform this operation.
    #[error("Unauthorized caller: {0:?}")]
    Unauthorized(Address),

    /// The platform is paused.
    #[error("Platform is paused")]
    PlatformPaused,

    /// The loan's market is paused.
    #[error("Market paused: {0:?}")]
    MarketPaused(Token),

    /// Terms aggregation failed.
    #[error("Consensus failure: {0}")]
    Consensus(#[from] ConsensusError),

    /// Price resolution failed.
    #[error("Price resolution failure: {0}")]
    Resolver(#[from] ResolverError),

    /// No loan recorded under the id.
    #[error("Loan not found: {0}")]
    LoanNotFound(u64),

    /// The named borrower is not the loan's recorded borrower.
    #[error("Borrower {got:?} does not match loan {loan_id}")]
    BorrowerLoanMismatch { loan_id: u64, got: Address },

    /// Caller does not own the loan.
    #[error("Caller {caller:?} does not own loan {loan_id}")]
    NotLoanOwner { loan_id: u64, caller: Address },

    /// Operation invalid for the loan's current status.
    #[error("Cannot {operation} a loan in status {status:?}")]
    InvalidLoanStatus {
        status: LoanStatus,
        operation: &'static str,
    },

    /// Zero or overflowing amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(&'static str),

    /// Requested principal above the accepted maximum.
    #[error("Borrow amount {amount} exceeds authorized maximum {max}")]
    AmountExceedsMaximum { amount: u128, max: u128 },

    /// Collateral value below what the accepted ratio requires.
    #[error("More collateral required: value {collateral_value} below required {required_value}")]
    MoreCollateralRequired {
        required_value: U256,
        collateral_value: U256,
    },

    /// Oracle reading older than the staleness bound.
    #[error("Oracle price too old: age {age}s exceeds {limit}s")]
    StaleOraclePrice { age: u64, limit: u64 },

    /// Accepted terms expired before takeout.
    #[error("Terms expired at {expired_at}, now {now}")]
    TermsExpired { expired_at: u64, now: u64 },

    /// Newest collateral deposit is younger than the safety interval.
    #[error("Collateral deposited too recently: age {age}s of required {required}s")]
    CollateralTooRecent { age: u64, required: u64 },

    /// Pool debt ratio would exceed the platform maximum.
    #[error("Debt ratio {ratio} bps exceeds maximum {max} bps")]
    DebtRatioExceeded { ratio: u64, max: u64 },

    /// The loan does not qualify for liquidation.
    #[error("Loan {0} does not need liquidation")]
    LiquidationNotRequired(u64),

    /// No finalized interest round for the window.
    #[error("No finalized interest for lender {lender:?} ending {end_time}")]
    InterestNotFinalized { lender: Address, end_time: u64 },

    /// Interest for the window was already withdrawn.
    #[error("Interest already claimed for lender {lender:?} ending {end_time}")]
    InterestAlreadyClaimed { lender: Address, end_time: u64 },

    /// The loan has no escrow delegate.
    #[error("Loan {0} has no escrow")]
    LoanHasNoEscrow(u64),

    /// Escrow boundary failure.
    #[error("Escrow failure: {0}")]
    EscrowFailure(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
