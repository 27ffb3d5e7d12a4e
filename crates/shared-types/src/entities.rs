//! # Core Domain Primitives
//!
//! Aliases and constants shared by every subsystem.

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte hash (Keccak-256).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
///
/// All participant, token, and escrow identities use this form.
pub type Address = [u8; 20];

/// A token identifier (alias for `Address` in asset contexts).
pub type Token = Address;

/// The all-zero address, rejected wherever a real identity is required.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Basis-point scale: rates and ratios are expressed in 1/10000ths.
pub const BPS_SCALE: u64 = 10_000;

/// Seconds in a (non-leap) year, used for pro-rata interest accrual.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Returns true for the all-zero address.
pub fn is_zero_address(addr: &Address) -> bool {
    addr == &ZERO_ADDRESS
}
