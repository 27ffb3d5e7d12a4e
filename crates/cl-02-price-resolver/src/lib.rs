//! # cl-02-price-resolver
//!
//! Price-pair registry and normalization for CreditLine.
//!
//! Maps an `(base, quote)` asset pair to a price source plus
//! inversion/decimals metadata and produces normalized valuations.
//! Lookups for unregistered pairs fail loudly; readings carry their
//! source timestamps so consumers can enforce their own staleness
//! bounds.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use domain::{PairKey, PriceReading, ResolverError, ResolverResult, Valuation};
pub use ports::PriceSource;
pub use service::PriceResolver;
