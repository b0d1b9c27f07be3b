//! Vault error types

use thiserror::Error;
use vaultgov_core::{
    AccessError, Address, ConfigError, ErrorKind, MathError, OracleError, Timestamp, TokenError,
};

/// Vault accounting errors
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Funds of {owner} are frozen until {until} (now {now})")]
    Frozen {
        owner: Address,
        until: Timestamp,
        now: Timestamp,
    },

    #[error("{component} is bound to {actual}, configuration expects {expected}")]
    CollaboratorMismatch {
        component: &'static str,
        expected: Address,
        actual: Address,
    },

    #[error("Pair {pair} does not hold the reward token {token}")]
    PairWithoutRewardToken { pair: Address, token: Address },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Arithmetic error: {0}")]
    Math(#[from] MathError),

    #[error("Token transfer failed: {0}")]
    Token(#[from] TokenError),

    #[error("Staking pool call failed: {0}")]
    Oracle(#[from] OracleError),
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Frozen { .. }
            | VaultError::CollaboratorMismatch { .. }
            | VaultError::PairWithoutRewardToken { .. } => ErrorKind::Precondition,
            VaultError::Config(e) => e.kind(),
            VaultError::Access(e) => e.kind(),
            VaultError::Math(e) => e.kind(),
            VaultError::Token(e) => e.kind(),
            VaultError::Oracle(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
