//! # cl-03-loan-ledger
//!
//! The collateralized loan state machine for CreditLine.
//!
//! ## Architecture
//!
//! A loan advances `NonExistent → TermsSet → Active → {Closed |
//! Liquidated}` and never regresses. Origination consumes a quorum-
//! accepted terms batch from `cl-01-consensus`; activation and
//! liquidation judge collateral sufficiency through `cl-02-price-
//! resolver` valuations, bounded by an oracle-staleness window.
//!
//! Every state-mutating operation is atomic under a single serialized
//! ledger: authorization first, then validation, then commit. The one
//! deliberate silent path is collateral withdrawal, which clamps an
//! over-ask to the safe surplus instead of failing.
//!
//! ```text
//! borrower ──create_loan_with_terms──→ TermsSet
//!          ──deposit_collateral─────→ (collateral grows)
//!          ──take_out_loan──────────→ Active   (ratio + freshness checks)
//!          ──repay──────────────────→ Closed   (owed reaches zero)
//! anyone   ──liquidate_loan─────────→ Liquidated (expired or undercollateralized)
//! ```

pub mod domain;
pub mod ports;
pub mod service;
pub mod state;

// Re-export main types
pub use domain::{
    AcceptedTerms, LedgerError, LedgerResult, Loan, LoanStatus, MarketState, RepayOutcome,
};
pub use ports::{EscrowGateway, NullEscrow};
pub use service::LoanLedger;
pub use state::{LedgerState, MarketConfig};
