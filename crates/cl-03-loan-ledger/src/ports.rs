//! Outbound ports for the loan ledger.
//!
//! The escrow boundary is a factory call plus value queries; strategy
//! internals stay behind it.

use shared_types::Address;

/// Per-loan custody delegate boundary.
pub trait EscrowGateway: Send + Sync {
    /// Instantiate an escrow for a loan, returning its address.
    fn create_escrow(&self, loan_id: u64) -> Result<Address, String>;

    /// Current value the escrow tracks for a loan, lending-token units.
    fn calculate_total_value(&self, loan_id: u64) -> Result<u128, String>;

    /// Whether the escrow's tracked value sits below its required floor.
    fn is_under_valued(&self, loan_id: u64) -> Result<bool, String>;
}

/// Escrow gateway for deployments without external-strategy custody.
/// Creation fails; value queries report nothing under management.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEscrow;

impl EscrowGateway for NullEscrow {
    fn create_escrow(&self, _loan_id: u64) -> Result<Address, String> {
        Err("escrow custody not supported by this market".into())
    }

    fn calculate_total_value(&self, _loan_id: u64) -> Result<u128, String> {
        Ok(0)
    }

    fn is_under_valued(&self, _loan_id: u64) -> Result<bool, String> {
        Ok(false)
    }
}
