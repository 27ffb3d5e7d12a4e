//! Outbound ports for the price resolver.

use crate::domain::PriceReading;

/// A live price feed for one registered pair.
///
/// Implementations wrap whatever venue actually serves the price; the
/// resolver only requires the latest reading with its timestamp.
pub trait PriceSource: Send + Sync {
    /// The most recent reading this source can serve.
    fn latest_answer(&self) -> Result<PriceReading, String>;
}
