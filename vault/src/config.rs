//! Vault configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use vaultgov_core::config::{self, ConfigError};
use vaultgov_core::{Address, Amount, PoolId};

/// Scale restoring the decimals an 18-decimal amount loses under a square root
pub const DEFAULT_QUADRATIC_SCALE: Amount = 1_000_000_000;

/// Addresses and tuning of a vault deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Address the vault holds custody under
    pub address: Address,
    pub reward_token: Address,
    /// Liquidity pair whose shares are deposited as pool tokens
    pub pool_token: Address,
    /// Staking pool the pool tokens are staked into
    pub reward_pool: Address,
    /// Slot of the pool token inside the staking pool
    pub pool_id: PoolId,
    #[serde(default = "default_quadratic_scale")]
    pub quadratic_scale: Amount,
}

fn default_quadratic_scale() -> Amount {
    DEFAULT_QUADRATIC_SCALE
}

impl VaultConfig {
    pub fn new(
        address: Address,
        reward_token: Address,
        pool_token: Address,
        reward_pool: Address,
        pool_id: PoolId,
    ) -> Self {
        Self {
            address,
            reward_token,
            pool_token,
            reward_pool,
            pool_id,
            quadratic_scale: DEFAULT_QUADRATIC_SCALE,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = config::from_toml_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = config::load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quadratic_scale == 0 {
            return Err(ConfigError::invalid("quadratic_scale", "must be non-zero"));
        }
        if self.reward_token == self.pool_token {
            return Err(ConfigError::invalid(
                "pool_token",
                "must differ from the reward token",
            ));
        }
        Ok(())
    }
}
