//! Pair registry entities.

use crate::ports::PriceSource;
use serde::{Deserialize, Serialize};
use shared_types::{Token, U256};
use std::sync::Arc;

/// Registry key for a `(base, quote)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub base: Token,
    pub quote: Token,
}

impl PairKey {
    pub fn new(base: Token, quote: Token) -> Self {
        Self { base, quote }
    }

    /// Whether either side of the pair references `token`.
    pub fn references(&self, token: &Token) -> bool {
        &self.base == token || &self.quote == token
    }
}

/// A raw reading from a price source: quote units per base unit at the
/// source's native decimal precision, plus the reading's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceReading {
    pub value: U256,
    pub timestamp: u64,
}

/// A normalized valuation in the requested output precision, carrying
/// the timestamp of the reading it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub value: u128,
    pub timestamp: u64,
}

/// Registered metadata for one pair.
#[derive(Clone)]
pub struct PairConfig {
    /// The price source serving this pair.
    pub source: Arc<dyn PriceSource>,
    /// The source quotes the reciprocal of this pair.
    pub inverted: bool,
    /// Decimal precision of the source's readings.
    pub source_decimals: u32,
    /// Decimal precision of base-token amounts.
    pub base_decimals: u32,
}
