//! Point-in-time copy of every ledger-resident record

use crate::StorageError;
use serde::{Deserialize, Serialize};
use vaultgov_core::{BlockNumber, Clock, Timestamp};
use vaultgov_governance::{Governance, GovernanceSnapshot};
use vaultgov_vault::{Vault, VaultSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCheckpoint {
    pub taken_at: Timestamp,
    pub block: BlockNumber,
    pub vault: VaultSnapshot,
    pub governance: GovernanceSnapshot,
}

impl LedgerCheckpoint {
    pub fn capture(vault: &Vault, governance: &Governance, clock: &dyn Clock) -> Self {
        Self {
            taken_at: clock.now(),
            block: clock.block_number(),
            vault: vault.snapshot(),
            governance: governance.snapshot(),
        }
    }

    /// Default file name: `checkpoint-<block>-<taken_at>`, zero padded so
    /// names sort chronologically
    pub fn name(&self) -> String {
        format!("checkpoint-{:020}-{:020}", self.block, self.taken_at)
    }

    /// Load the records back into `vault` and `governance`.
    ///
    /// The governance records are validated first; nothing is replaced if
    /// they are rejected.
    pub fn apply(self, vault: &mut Vault, governance: &mut Governance) -> Result<(), StorageError> {
        governance.restore(self.governance)?;
        vault.restore(self.vault);
        Ok(())
    }
}
