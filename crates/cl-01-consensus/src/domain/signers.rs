//! The active signer set.
//!
//! Quorum counts distinct signers; membership mutation is admin-gated and
//! separate from the submission path.

use super::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::HashSet;
use tracing::info;

/// Authorized off-chain signers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerSet {
    admin: Address,
    signers: HashSet<Address>,
}

impl SignerSet {
    /// Empty set administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            signers: HashSet::new(),
        }
    }

    /// Authorize a signer.
    pub fn add_signer(&mut self, caller: Address, signer: Address) -> ConsensusResult<()> {
        self.require_admin(caller)?;
        if self.signers.insert(signer) {
            info!("[Signers] Added {:?} ({} active)", signer, self.signers.len());
        }
        Ok(())
    }

    /// Revoke a signer. Nonces it consumed stay consumed.
    pub fn remove_signer(&mut self, caller: Address, signer: Address) -> ConsensusResult<()> {
        self.require_admin(caller)?;
        if self.signers.remove(&signer) {
            info!(
                "[Signers] Removed {:?} ({} active)",
                signer,
                self.signers.len()
            );
        }
        Ok(())
    }

    /// Membership check used on every submission.
    pub fn contains(&self, signer: &Address) -> bool {
        self.signers.contains(signer)
    }

    /// Number of active signers.
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// True when no signers are authorized.
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    fn require_admin(&self, caller: Address) -> ConsensusResult<()> {
        if caller != self.admin {
            return Err(ConsensusError::Unauthorized(caller));
        }
        Ok(())
    }
}
