//! # Shared Types
//!
//! Domain primitives and cross-subsystem services for CreditLine.
//!
//! ## Clusters
//!
//! - **Primitives**: `Address`, `Hash`, `U256`, basis-point scale
//! - **Clock**: time source abstraction for deterministic testing
//! - **Settings**: named platform parameters with timelocked updates
//! - **Registry**: stable module handles resolved via interface dispatch

pub mod clock;
pub mod entities;
pub mod errors;
pub mod registry;
pub mod settings;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::{Address, Hash, Token, U256, BPS_SCALE, SECONDS_PER_YEAR, ZERO_ADDRESS};
pub use errors::{RegistryError, SettingsError};
pub use registry::{Module, ModuleId, ModuleRegistry};
pub use settings::{PlatformSetting, PlatformSettings, SettingName, SettingsProvider, SharedSettings};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
