//! Market-level accounting.

use serde::{Deserialize, Serialize};
use shared_types::{U256, BPS_SCALE};

/// Running totals for one lending market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    /// Lifetime lender deposits.
    pub total_supplied: u128,
    /// Lifetime principal repaid.
    pub total_repaid: u128,
    /// Lifetime principal borrowed.
    pub total_borrowed: u128,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_deposit(&mut self, amount: u128) {
        self.total_supplied = self.total_supplied.saturating_add(amount);
    }

    pub fn on_borrow(&mut self, amount: u128) {
        self.total_borrowed = self.total_borrowed.saturating_add(amount);
    }

    pub fn on_repay(&mut self, principal: u128) {
        self.total_repaid = self.total_repaid.saturating_add(principal);
    }

    /// Pool debt ratio in basis points if `new_loan_amount` were
    /// borrowed now: `(borrowed − repaid + new) × 10000 / supplied`.
    /// `None` when nothing has been supplied.
    pub fn supply_to_debt_for(&self, new_loan_amount: u128) -> Option<u64> {
        if self.total_supplied == 0 {
            return None;
        }
        let outstanding = U256::from(self.total_borrowed)
            .saturating_sub(U256::from(self.total_repaid))
            .saturating_add(U256::from(new_loan_amount));
        let ratio = outstanding * U256::from(BPS_SCALE) / U256::from(self.total_supplied);
        Some(ratio.min(U256::from(u64::MAX)).as_u64())
    }
}
