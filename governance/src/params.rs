//! Governance tuning parameters and deployment configuration

use crate::config::{
    DEFAULT_EXECUTION_DELAY, DEFAULT_EXECUTION_EXPIRATION, DEFAULT_MINIMUM_VOTING_PERIOD,
    DEFAULT_PROPOSAL_THRESHOLD, DEFAULT_QUORUM,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vaultgov_core::config::{self, ConfigError};
use vaultgov_core::{Address, Amount};

/// Timing and vote thresholds applied to every proposal.
///
/// Thresholds are expressed in quadratic voting power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    /// Shortest voting period a proposer may choose (seconds)
    pub minimum_voting_period: u64,
    /// Wait between the end of voting and the execution window (seconds)
    pub execution_delay: u64,
    /// Length of the execution window (seconds)
    pub execution_expiration: u64,
    /// Supporting votes required for a proposal to pass
    pub quorum: Amount,
    /// Voting power a proposer must exceed
    pub proposal_threshold: Amount,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            minimum_voting_period: DEFAULT_MINIMUM_VOTING_PERIOD,
            execution_delay: DEFAULT_EXECUTION_DELAY,
            execution_expiration: DEFAULT_EXECUTION_EXPIRATION,
            quorum: DEFAULT_QUORUM,
            proposal_threshold: DEFAULT_PROPOSAL_THRESHOLD,
        }
    }
}

impl GovernanceParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_voting_period == 0 {
            return Err(ConfigError::invalid("minimum_voting_period", "must be non-zero"));
        }
        if self.execution_expiration == 0 {
            return Err(ConfigError::invalid("execution_expiration", "must be non-zero"));
        }
        Ok(())
    }

    /// Parameters with every field set in `update` replaced
    pub fn merged(&self, update: &ParamsUpdate) -> Self {
        Self {
            minimum_voting_period: update
                .minimum_voting_period
                .unwrap_or(self.minimum_voting_period),
            execution_delay: update.execution_delay.unwrap_or(self.execution_delay),
            execution_expiration: update
                .execution_expiration
                .unwrap_or(self.execution_expiration),
            quorum: update.quorum.unwrap_or(self.quorum),
            proposal_threshold: update.proposal_threshold.unwrap_or(self.proposal_threshold),
        }
    }
}

/// Partial parameter update; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsUpdate {
    pub minimum_voting_period: Option<u64>,
    pub execution_delay: Option<u64>,
    pub execution_expiration: Option<u64>,
    pub quorum: Option<Amount>,
    pub proposal_threshold: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Address governance acts under, as seen by the vault
    pub address: Address,
    pub governers: Vec<Address>,
    #[serde(default)]
    pub params: GovernanceParams,
}

impl GovernanceConfig {
    pub fn new(address: Address, governers: Vec<Address>) -> Self {
        Self {
            address,
            governers,
            params: GovernanceParams::default(),
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
        if self.governers.is_empty() {
            return Err(ConfigError::invalid("governers", "at least one governer is required"));
        }
        self.params.validate()
    }
}
