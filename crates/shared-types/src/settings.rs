//! # Platform Settings
//!
//! Named operational parameters with `{value, min, max}` bounds and a
//! timelocked two-phase update path. Subsystems consume settings read-only
//! through the [`SettingsProvider`] port; mutation is admin-gated.
//!
//! ## Update protocol
//!
//! 1. `timelock_setting(name, proposed)` records the proposal and the
//!    earliest apply time (`now + MinimumTimelock`).
//! 2. `update_setting(name, value)` after the wait, where `value` must
//!    equal the recorded proposal exactly.

use crate::entities::Address;
use crate::errors::SettingsError;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Well-known platform setting names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingName {
    /// Distinct signer responses required before a round can finalize.
    RequiredSubmissions,
    /// Tolerance band in basis points of the round average.
    MaximumTolerance,
    /// Maximum age (seconds) of a signer response.
    ResponseExpiryLength,
    /// Minimum seconds between loan-terms requests per borrower.
    RequestTermsRateLimit,
    /// Lifetime (seconds) of accepted terms before takeout.
    TermsExpiryTime,
    /// Maximum requestable loan duration in seconds.
    MaximumLoanDuration,
    /// Maximum age (seconds) of an oracle reading.
    PriceMaxAge,
    /// Maximum pool debt ratio in basis points.
    MaximumDebtRatio,
    /// Minimum wait (seconds) between timelock and apply.
    MinimumTimelock,
    /// Minimum age (seconds) of the newest collateral deposit at takeout.
    SafetyInterval,
}

/// A proposed value waiting out its timelock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub value: u64,
    pub earliest_apply: u64,
}

/// One named setting with bounds and an optional pending update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSetting {
    pub value: u64,
    pub min: u64,
    pub max: u64,
    pub pending: Option<PendingUpdate>,
}

impl PlatformSetting {
    fn new(value: u64, min: u64, max: u64) -> Self {
        Self {
            value,
            min,
            max,
            pending: None,
        }
    }
}

/// Read-only settings access for consuming subsystems.
pub trait SettingsProvider: Send + Sync {
    /// Current value of `name`. Every well-known name is seeded at
    /// construction, so consumers treat this as total.
    fn setting(&self, name: SettingName) -> u64;
}

/// The platform settings store.
pub struct PlatformSettings {
    admin: Address,
    settings: HashMap<SettingName, PlatformSetting>,
}

impl PlatformSettings {
    /// Create a store seeded with every well-known setting.
    pub fn new(admin: Address) -> Self {
        let mut settings = HashMap::new();
        settings.insert(
            SettingName::RequiredSubmissions,
            PlatformSetting::new(3, 1, 100),
        );
        settings.insert(
            SettingName::MaximumTolerance,
            PlatformSetting::new(320, 0, 10_000),
        );
        settings.insert(
            SettingName::ResponseExpiryLength,
            PlatformSetting::new(900, 60, 86_400),
        );
        settings.insert(
            SettingName::RequestTermsRateLimit,
            PlatformSetting::new(3_600, 60, 604_800),
        );
        settings.insert(
            SettingName::TermsExpiryTime,
            PlatformSetting::new(3_600, 300, 604_800),
        );
        settings.insert(
            SettingName::MaximumLoanDuration,
            PlatformSetting::new(5_184_000, 86_400, 31_536_000),
        );
        settings.insert(SettingName::PriceMaxAge, PlatformSetting::new(300, 60, 86_400));
        settings.insert(
            SettingName::MaximumDebtRatio,
            PlatformSetting::new(5_000, 500, 10_000),
        );
        settings.insert(
            SettingName::MinimumTimelock,
            PlatformSetting::new(86_400, 3_600, 2_592_000),
        );
        settings.insert(SettingName::SafetyInterval, PlatformSetting::new(300, 0, 3_600));
        Self { admin, settings }
    }

    /// Snapshot of a named setting.
    pub fn get(&self, name: SettingName) -> Result<PlatformSetting, SettingsError> {
        self.settings
            .get(&name)
            .cloned()
            .ok_or(SettingsError::UnknownSetting(name))
    }

    /// Record a proposed value; it becomes applicable after the minimum
    /// timelock has elapsed.
    pub fn timelock_setting(
        &mut self,
        caller: Address,
        name: SettingName,
        proposed: u64,
        now: u64,
    ) -> Result<(), SettingsError> {
        self.require_admin(caller)?;
        let minimum_timelock = self.setting(SettingName::MinimumTimelock);

        let setting = self
            .settings
            .get_mut(&name)
            .ok_or(SettingsError::UnknownSetting(name))?;
        if proposed < setting.min || proposed > setting.max {
            return Err(SettingsError::ValueOutOfRange {
                name,
                value: proposed,
                min: setting.min,
                max: setting.max,
            });
        }

        let earliest_apply = now.saturating_add(minimum_timelock);
        setting.pending = Some(PendingUpdate {
            value: proposed,
            earliest_apply,
        });
        info!(
            "[Settings] Timelocked {:?} -> {} (applies at {})",
            name, proposed, earliest_apply
        );
        Ok(())
    }

    /// Apply a previously timelocked value. `value` must match the
    /// recorded proposal exactly and the minimum wait must have elapsed.
    pub fn update_setting(
        &mut self,
        caller: Address,
        name: SettingName,
        value: u64,
        now: u64,
    ) -> Result<(), SettingsError> {
        self.require_admin(caller)?;
        let setting = self
            .settings
            .get_mut(&name)
            .ok_or(SettingsError::UnknownSetting(name))?;
        let pending = setting
            .pending
            .ok_or(SettingsError::NoPendingUpdate(name))?;

        if pending.value != value {
            return Err(SettingsError::TimelockValueMismatch {
                proposed: pending.value,
                got: value,
            });
        }
        if now < pending.earliest_apply {
            return Err(SettingsError::TimelockNotElapsed {
                earliest_apply: pending.earliest_apply,
                now,
            });
        }

        setting.value = value;
        setting.pending = None;
        info!("[Settings] Updated {:?} -> {}", name, value);
        Ok(())
    }

    /// Discard a pending proposal without applying it.
    pub fn cancel_timelock(
        &mut self,
        caller: Address,
        name: SettingName,
    ) -> Result<(), SettingsError> {
        self.require_admin(caller)?;
        let setting = self
            .settings
            .get_mut(&name)
            .ok_or(SettingsError::UnknownSetting(name))?;
        if setting.pending.take().is_none() {
            return Err(SettingsError::NoPendingUpdate(name));
        }
        Ok(())
    }

    fn require_admin(&self, caller: Address) -> Result<(), SettingsError> {
        if caller != self.admin {
            return Err(SettingsError::Unauthorized(caller));
        }
        Ok(())
    }
}

impl SettingsProvider for PlatformSettings {
    fn setting(&self, name: SettingName) -> u64 {
        self.settings.get(&name).map(|s| s.value).unwrap_or_default()
    }
}

/// Cheaply clonable shared handle over the settings store.
#[derive(Clone)]
pub struct SharedSettings(Arc<RwLock<PlatformSettings>>);

impl SharedSettings {
    pub fn new(inner: PlatformSettings) -> Self {
        Self(Arc::new(RwLock::new(inner)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, PlatformSettings> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, PlatformSettings> {
        self.0.write()
    }
}

impl SettingsProvider for SharedSettings {
    fn setting(&self, name: SettingName) -> u64 {
        self.0.read().setting(name)
    }
}
