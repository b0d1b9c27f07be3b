//! Vault capability consumed by governance
//!
//! Governance never owns the vault. It is handed a [`VotingEscrow`] that reads
//! voting power and freezes voters, and reaches the vault synchronously
//! through it.

use crate::account::Account;
use crate::error::Result;
use crate::vault::Vault;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use vaultgov_core::{Address, Amount};

/// Voting-power interface of a vault
pub trait VotingEscrow: Send + Sync {
    /// Extend the freeze of `owner` by `duration` seconds on behalf of `caller`
    fn freeze(&self, caller: &Address, owner: &Address, duration: u64) -> Result<()>;

    fn votes(&self, owner: &Address) -> Amount;

    fn quadratic_votes(&self, owner: &Address) -> Result<Amount>;

    fn is_frozen(&self, owner: &Address) -> bool;
}

/// Serialized, shareable handle onto a [`Vault`].
///
/// Every call takes the lock for its whole duration, so operations from
/// depositors and from governance are linearized.
#[derive(Clone)]
pub struct SharedVault {
    inner: Arc<RwLock<Vault>>,
}

impl SharedVault {
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(RwLock::new(vault)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vault> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vault> {
        self.inner.write()
    }

    pub fn address(&self) -> Address {
        self.inner.read().address()
    }

    pub fn account(&self, owner: &Address) -> Account {
        self.inner.read().account(owner)
    }

    pub fn deposit(
        &self,
        caller: &Address,
        reward_amount: Amount,
        pool_amount: Amount,
    ) -> Result<()> {
        self.inner.write().deposit(caller, reward_amount, pool_amount)
    }

    pub fn withdraw_all(&self, caller: &Address) -> Result<()> {
        self.inner.write().withdraw_all(caller)
    }

    pub fn pending_reward(&self, owner: &Address) -> Result<Amount> {
        self.inner.read().pending_reward(owner)
    }

    pub fn set_governance(&self, caller: &Address, new_governance: Address) -> Result<()> {
        self.inner.write().set_governance(caller, new_governance)
    }
}

impl VotingEscrow for SharedVault {
    fn freeze(&self, caller: &Address, owner: &Address, duration: u64) -> Result<()> {
        self.inner.write().freeze(caller, owner, duration)
    }

    fn votes(&self, owner: &Address) -> Amount {
        self.inner.read().votes(owner)
    }

    fn quadratic_votes(&self, owner: &Address) -> Result<Amount> {
        self.inner.read().quadratic_votes(owner)
    }

    fn is_frozen(&self, owner: &Address) -> bool {
        self.inner.read().is_frozen(owner)
    }
}
