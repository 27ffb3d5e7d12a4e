//! Loan entity and lifecycle.

use super::{LedgerError, LedgerResult};
use cl_01_consensus::FinalizedTerms;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256, BPS_SCALE, SECONDS_PER_YEAR};

/// Lifecycle states of a loan. Transitions only ever move forward;
/// liquidation bypasses `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    NonExistent,
    TermsSet,
    Active,
    Closed,
    Liquidated,
}

impl LoanStatus {
    /// Whether `self → to` is a legal forward transition.
    pub fn can_advance_to(self, to: LoanStatus) -> bool {
        matches!(
            (self, to),
            (LoanStatus::NonExistent, LoanStatus::TermsSet)
                | (LoanStatus::TermsSet, LoanStatus::Active)
                | (LoanStatus::Active, LoanStatus::Closed)
                | (LoanStatus::Active, LoanStatus::Liquidated)
        )
    }
}

/// Terms a quorum accepted for one loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTerms {
    /// Yearly interest rate, basis points.
    pub interest_rate: u64,
    /// Minimum collateral ratio, basis points.
    pub collateral_ratio: u64,
    /// Maximum principal, lending-token base units.
    pub max_loan_amount: u128,
    /// Accepted duration in seconds.
    pub duration: u64,
}

impl AcceptedTerms {
    /// Pair finalized consensus values with the requested duration.
    pub fn new(finalized: FinalizedTerms, duration: u64) -> Self {
        Self {
            interest_rate: finalized.interest_rate,
            collateral_ratio: finalized.collateral_ratio,
            max_loan_amount: finalized.max_loan_amount,
            duration,
        }
    }
}

/// A collateralized loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: u64,
    pub status: LoanStatus,
    pub borrower: Address,
    pub recipient: Address,
    pub terms: AcceptedTerms,
    /// Accepted terms are unusable after this time.
    pub terms_expiry: u64,
    pub principal_owed: u128,
    pub interest_owed: u128,
    /// Held collateral, collateral-token base units.
    pub collateral: u128,
    /// Time of the newest collateral deposit.
    pub last_collateral_in: u64,
    /// Escrow delegate, when borrowed funds left the borrower's custody.
    pub escrow: Option<Address>,
    pub liquidated: bool,
    pub start_time: u64,
    pub end_time: u64,
}

impl Loan {
    /// Open a loan in `TermsSet` with no collateral.
    pub fn with_terms(
        id: u64,
        borrower: Address,
        recipient: Address,
        terms: AcceptedTerms,
        terms_expiry: u64,
    ) -> Self {
        Self {
            id,
            status: LoanStatus::TermsSet,
            borrower,
            recipient,
            terms,
            terms_expiry,
            principal_owed: 0,
            interest_owed: 0,
            collateral: 0,
            last_collateral_in: 0,
            escrow: None,
            liquidated: false,
            start_time: 0,
            end_time: 0,
        }
    }

    /// Total outstanding debt.
    pub fn total_owed(&self) -> u128 {
        self.principal_owed.saturating_add(self.interest_owed)
    }

    /// An active loan whose term has run out.
    pub fn is_expired(&self, now: u64) -> bool {
        self.status == LoanStatus::Active && now > self.end_time
    }

    /// Advance the lifecycle, rejecting any non-forward move.
    pub fn advance(&mut self, to: LoanStatus, operation: &'static str) -> LedgerResult<()> {
        if !self.status.can_advance_to(to) {
            return Err(LedgerError::InvalidLoanStatus {
                status: self.status,
                operation,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// What a repayment actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepayOutcome {
    /// Portion of the payment applied to the debt.
    pub applied: u128,
    /// Portion applied to interest.
    pub interest_paid: u128,
    /// Portion applied to principal.
    pub principal_paid: u128,
    /// Collateral released back to the borrower.
    pub collateral_released: u128,
    /// The loan closed with this payment.
    pub closed: bool,
}

/// Interest owed on `principal` at `rate_bps` per year over `duration`
/// seconds, floor-rounded.
pub fn interest_for(principal: u128, rate_bps: u64, duration: u64) -> LedgerResult<u128> {
    let scaled = U256::from(principal)
        .checked_mul(U256::from(rate_bps))
        .and_then(|v| v.checked_mul(U256::from(duration)))
        .ok_or(LedgerError::InvalidAmount("interest computation overflows"))?;
    let owed = scaled / (U256::from(BPS_SCALE) * U256::from(SECONDS_PER_YEAR));
    if owed > U256::from(u128::MAX) {
        return Err(LedgerError::InvalidAmount("interest exceeds amount width"));
    }
    Ok(owed.as_u128())
}

/// Collateral value required for `principal` at `ratio_bps`.
pub fn required_collateral_value(principal: u128, ratio_bps: u64) -> U256 {
    U256::from(principal) * U256::from(ratio_bps) / U256::from(BPS_SCALE)
}
