//! Mutable state of the loan ledger.
//!
//! `LedgerState` is the explicit aggregate every operation mutates;
//! the service wraps it in a single lock so each operation commits
//! whole or not at all.

use crate::domain::{Loan, MarketState};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Token};
use std::collections::{HashMap, HashSet};

/// Static description of the market a ledger serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Token being lent.
    pub lending_token: Token,
    /// Token held as collateral.
    pub collateral_token: Token,
    /// Decimal precision of lending-token amounts.
    pub lending_decimals: u32,
}

/// Encapsulates the mutable state of the loan ledger: the loan book,
/// market totals, lender balances, and pause flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    /// Loan book by id.
    pub loans: HashMap<u64, Loan>,
    /// Next loan id to allocate.
    pub next_loan_id: u64,
    /// Market totals.
    pub market: MarketState,
    /// Per-lender supplied balances.
    pub lender_supply: HashMap<Address, u128>,
    /// Interest windows already withdrawn, keyed `(lender, end_time)`.
    pub claimed_interest: HashSet<(Address, u64)>,
    /// Platform-wide pause flag.
    pub platform_paused: bool,
    /// Per-market pause flags, keyed by lending token.
    pub paused_markets: HashSet<Token>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next loan id.
    pub fn allocate_loan_id(&mut self) -> u64 {
        let id = self.next_loan_id;
        self.next_loan_id += 1;
        id
    }

    /// Whether operations on `market` are suspended.
    pub fn is_paused(&self, market: &Token) -> bool {
        self.platform_paused || self.paused_markets.contains(market)
    }
}
