//! # CreditLine Test Suite
//!
//! Unified test crate for cross-subsystem flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Consensus → resolver → ledger choreography
//!     └── flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cl-tests
//!
//! # By category
//! cargo test -p cl-tests integration::
//! ```

pub mod integration;
