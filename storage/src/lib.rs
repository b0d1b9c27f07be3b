//! VaultGov Storage Layer - File-Based Checkpoints
//!
//! Ledger records live in memory; checkpoints copy them to disk:
//! - Pretty JSON for inspection
//! - Bincode for fast loading (preferred on load)

pub mod checkpoint;

pub use checkpoint::LedgerCheckpoint;

use chrono::DateTime;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vaultgov_governance::GovernanceError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    #[error("Checkpoint rejected: {0}")]
    Rejected(#[from] GovernanceError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Directory of checkpoint files
pub struct LedgerStore {
    data_dir: PathBuf,
}

impl LedgerStore {
    /// Open the checkpoint directory, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write `checkpoint` under its default name and return that name
    pub fn save_checkpoint(&self, checkpoint: &LedgerCheckpoint) -> Result<String> {
        let name = checkpoint.name();
        self.save(&name, checkpoint)?;

        let taken_at = DateTime::from_timestamp(checkpoint.taken_at as i64, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| checkpoint.taken_at.to_string());
        log::info!(
            "Checkpoint {} saved ({} accounts, {} proposals, taken {})",
            name,
            checkpoint.vault.accounts.len(),
            checkpoint.governance.proposals.len(),
            taken_at
        );
        Ok(name)
    }

    pub fn load_checkpoint(&self, name: &str) -> Result<LedgerCheckpoint> {
        self.load(name)
    }

    /// Most recent checkpoint by name order, if any
    pub fn latest_checkpoint(&self) -> Result<Option<LedgerCheckpoint>> {
        match self.list_checkpoints()?.last() {
            Some(name) => Ok(Some(self.load(name)?)),
            None => Ok(None),
        }
    }

    pub fn has_checkpoint(&self, name: &str) -> bool {
        self.bin_path(name).exists() || self.json_path(name).exists()
    }

    /// Names of every stored checkpoint, sorted
    pub fn list_checkpoints(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_checkpoint = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("json") | Some("bin")
            );
            if !is_checkpoint {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !names.iter().any(|n| n == stem) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    pub fn delete_checkpoint(&self, name: &str) -> Result<()> {
        let bin_path = self.bin_path(name);
        let json_path = self.json_path(name);

        if !bin_path.exists() && !json_path.exists() {
            return Err(StorageError::CheckpointNotFound(name.to_string()));
        }
        if bin_path.exists() {
            fs::remove_file(bin_path)?;
        }
        if json_path.exists() {
            fs::remove_file(json_path)?;
        }
        log::debug!("Checkpoint {} deleted", name);
        Ok(())
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.json_path(name), json)?;

        let bin = bincode::serialize(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.bin_path(name), bin)?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let bin_path = self.bin_path(name);
        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            return bincode::deserialize(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        let json_path = self.json_path(name);
        if json_path.exists() {
            let data = fs::read_to_string(&json_path)?;
            return serde_json::from_str(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        Err(StorageError::CheckpointNotFound(name.to_string()))
    }

    fn bin_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.bin", name))
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;
    use vaultgov_core::{
        Address, Amount, InMemoryToken, ManualClock, RewardOracle, TokenLedger, DAY, TOKEN_UNIT,
    };
    use vaultgov_governance::{ActionCall, Governance, GovernanceConfig};
    use vaultgov_sim::{EmissionSchedule, SimulatedPair, SimulatedRewardPool};
    use vaultgov_vault::{SharedVault, Vault, VaultCollaborators, VaultConfig};

    struct Ledger {
        clock: ManualClock,
        vault: SharedVault,
        gov: Governance,
    }

    fn ledger() -> Ledger {
        let clock = ManualClock::new(1_700_000_000, 50);
        let reward = InMemoryToken::new(Address::derive("reward"), "RWD");
        let pair = SimulatedPair::new(
            Address::derive("pair"),
            reward.address(),
            Address::derive("quote"),
            Arc::new(clock.clone()),
        );
        let pool = Arc::new(SimulatedRewardPool::new(
            Address::derive("chef"),
            reward.clone(),
            Arc::new(clock.clone()),
            EmissionSchedule::default(),
        ));
        let pid = pool.add_pool(1, Arc::new(pair.clone()));

        let vault = Vault::new(
            VaultConfig::new(
                Address::derive("vault"),
                reward.address(),
                pair.address(),
                pool.address(),
                pid,
            ),
            VaultCollaborators {
                reward_token: Arc::new(reward.clone()),
                pair: Arc::new(pair),
                reward_pool: pool,
                clock: Arc::new(clock.clone()),
            },
        )
        .unwrap();
        let vault = SharedVault::new(vault);

        let config = GovernanceConfig::new(
            Address::derive("governance"),
            vec![Address::derive("governer")],
        );
        vault
            .set_governance(&config.address, config.address)
            .unwrap();
        let mut gov =
            Governance::new(config, Arc::new(vault.clone()), Arc::new(clock.clone())).unwrap();

        let alice = Address::derive("alice");
        let amount: Amount = 10_000 * TOKEN_UNIT;
        reward.mint(&alice, amount).unwrap();
        reward.approve(&alice, &vault.address(), Amount::MAX).unwrap();
        vault.deposit(&alice, amount, 0).unwrap();

        let call = ActionCall::new(Address::derive("target"), 0, Vec::new());
        let id = gov.propose(&alice, "checkpointed", 3 * DAY, &call).unwrap();
        gov.vote(&alice, id, true).unwrap();

        Ledger { clock, vault, gov }
    }

    #[test]
    fn test_save_and_load_checkpoint() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        let l = ledger();

        let checkpoint = LedgerCheckpoint::capture(&l.vault.read(), &l.gov, &l.clock);
        let name = store.save_checkpoint(&checkpoint).unwrap();

        assert!(store.has_checkpoint(&name));
        assert!(dir.path().join(format!("{}.json", name)).exists());
        assert_eq!(store.load_checkpoint(&name).unwrap(), checkpoint);
    }

    #[test]
    fn test_json_fallback() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        let l = ledger();

        let checkpoint = LedgerCheckpoint::capture(&l.vault.read(), &l.gov, &l.clock);
        let name = store.save_checkpoint(&checkpoint).unwrap();
        fs::remove_file(dir.path().join(format!("{}.bin", name))).unwrap();

        assert_eq!(store.load_checkpoint(&name).unwrap(), checkpoint);
    }

    #[test]
    fn test_list_latest_and_delete() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        let l = ledger();

        assert!(store.latest_checkpoint().unwrap().is_none());

        let first = LedgerCheckpoint::capture(&l.vault.read(), &l.gov, &l.clock);
        store.save_checkpoint(&first).unwrap();
        l.clock.advance_blocks(10);
        l.clock.advance_time(60);
        let second = LedgerCheckpoint::capture(&l.vault.read(), &l.gov, &l.clock);
        let second_name = store.save_checkpoint(&second).unwrap();

        // Unrelated files are ignored
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let names = store.list_checkpoints().unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1], second_name);
        assert_eq!(store.latest_checkpoint().unwrap(), Some(second));

        store.delete_checkpoint(&second_name).unwrap();
        assert_eq!(store.list_checkpoints().unwrap().len(), 1);
        assert!(matches!(
            store.delete_checkpoint(&second_name),
            Err(StorageError::CheckpointNotFound(_))
        ));
    }

    #[test]
    fn test_apply_restores_records() {
        let mut l = ledger();
        let alice = Address::derive("alice");
        let checkpoint = LedgerCheckpoint::capture(&l.vault.read(), &l.gov, &l.clock);

        let mut fresh = ledger();
        fresh.clock.advance_time(30 * DAY);
        fresh.vault.withdraw_all(&alice).unwrap();
        assert_eq!(fresh.vault.account(&alice).voting_power, 0);

        checkpoint
            .clone()
            .apply(&mut fresh.vault.write(), &mut fresh.gov)
            .unwrap();
        assert_eq!(fresh.vault.account(&alice), l.vault.account(&alice));
        assert_eq!(fresh.gov.proposal(1), l.gov.proposal(1));

        // A checkpoint with a broken proposal sequence is refused as a whole
        let mut broken = checkpoint;
        broken.governance.proposals[0].id = 9;
        broken.vault.accounts.clear();
        assert!(broken.apply(&mut l.vault.write(), &mut l.gov).is_err());
        assert!(l.vault.account(&alice).voting_power > 0);
    }
}
