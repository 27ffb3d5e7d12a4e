//! # Module Registry - Stable Handles over Swappable Implementations
//!
//! Maps a stable [`ModuleId`] handle to the current implementation of that
//! logic, resolved via interface dispatch. The mutation path (`register`,
//! `upgrade`) is admin-gated and distinct from the hot-path `resolve`
//! lookup used by normal operation calls.

use crate::entities::Address;
use crate::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Stable logic handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleId {
    InterestConsensus,
    LoanTermsConsensus,
    PriceResolver,
    LoanLedger,
    EscrowFactory,
    Settings,
}

/// Behavior every registered module exposes to the registry.
pub trait Module: Send + Sync {
    /// The stable handle this implementation binds to.
    fn id(&self) -> ModuleId;
    /// Human-readable module name.
    fn name(&self) -> &'static str;
    /// Implementation version, bumped on upgrade.
    fn version(&self) -> u32;
}

/// A registered module.
pub type DynModule = Arc<dyn Module>;

/// Central registry of current module implementations.
pub struct ModuleRegistry {
    admin: Address,
    modules: HashMap<ModuleId, DynModule>,
}

impl ModuleRegistry {
    /// Create an empty registry administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            modules: HashMap::new(),
        }
    }

    /// Bind a handle to its first implementation.
    pub fn register(&mut self, caller: Address, module: DynModule) -> Result<(), RegistryError> {
        self.require_admin(caller)?;
        let id = module.id();
        if self.modules.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        info!(
            "[Registry] Registering {:?} ({} v{})",
            id,
            module.name(),
            module.version()
        );
        self.modules.insert(id, module);
        Ok(())
    }

    /// Swap the implementation behind an existing handle.
    ///
    /// Callers resolving through the handle observe the new
    /// implementation on their next lookup.
    pub fn upgrade(&mut self, caller: Address, module: DynModule) -> Result<(), RegistryError> {
        self.require_admin(caller)?;
        let id = module.id();
        let previous = self
            .modules
            .get(&id)
            .ok_or(RegistryError::UnknownModule(id))?;
        if module.version() <= previous.version() {
            warn!(
                "[Registry] Upgrading {:?} without a version bump ({} -> {})",
                id,
                previous.version(),
                module.version()
            );
        }
        info!(
            "[Registry] Upgraded {:?} to {} v{}",
            id,
            module.name(),
            module.version()
        );
        self.modules.insert(id, module);
        Ok(())
    }

    /// Resolve the current implementation behind a handle.
    pub fn resolve(&self, id: ModuleId) -> Result<DynModule, RegistryError> {
        self.modules
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownModule(id))
    }

    /// Check whether a handle is bound.
    pub fn is_registered(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    /// All bound handles.
    pub fn registered_ids(&self) -> Vec<ModuleId> {
        self.modules.keys().copied().collect()
    }

    fn require_admin(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.admin {
            return Err(RegistryError::Unauthorized(caller));
        }
        Ok(())
    }
}
