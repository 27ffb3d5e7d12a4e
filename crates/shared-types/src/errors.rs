//! # Error Types
//!
//! Errors for the shared settings store and module registry.

use crate::entities::Address;
use crate::registry::ModuleId;
use crate::settings::SettingName;
use thiserror::Error;

/// Errors raised by the platform settings store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Caller is not authorized to mutate settings.
    #[error("Unauthorized settings caller: {0:?}")]
    Unauthorized(Address),

    /// Setting name not present in the store.
    #[error("Unknown setting: {0:?}")]
    UnknownSetting(SettingName),

    /// Setting already created.
    #[error("Setting already exists: {0:?}")]
    AlreadyExists(SettingName),

    /// Proposed value outside the setting's [min, max] range.
    #[error("Value {value} out of range [{min}, {max}] for {name:?}")]
    ValueOutOfRange {
        name: SettingName,
        value: u64,
        min: u64,
        max: u64,
    },

    /// Update attempted with no pending timelocked value.
    #[error("No pending timelocked update for {0:?}")]
    NoPendingUpdate(SettingName),

    /// Applied value does not match the timelocked proposal.
    #[error("Timelock value mismatch: proposed {proposed}, got {got}")]
    TimelockValueMismatch { proposed: u64, got: u64 },

    /// Minimum timelock wait has not elapsed.
    #[error("Timelock not elapsed: applies at {earliest_apply}, now {now}")]
    TimelockNotElapsed { earliest_apply: u64, now: u64 },
}

/// Errors raised by the module registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Caller is not authorized to mutate the registry.
    #[error("Unauthorized registry caller: {0:?}")]
    Unauthorized(Address),

    /// No module registered under the handle.
    #[error("Unknown module: {0:?}")]
    UnknownModule(ModuleId),

    /// Handle already bound; use the upgrade path to replace it.
    #[error("Module already registered: {0:?}")]
    AlreadyRegistered(ModuleId),
}
