//! External collaborator interfaces
//!
//! - [`RewardOracle`]: an accruing staking pool that tracks accumulated reward
//!   per share for each pool slot. Its emission schedule is opaque to the vault.
//! - [`PairOracle`]: a two-reserve liquidity pair whose ownership shares are
//!   themselves a transferable token.

use crate::error::ErrorKind;
use crate::math::MathError;
use crate::token::{TokenError, TokenLedger};
use crate::{Address, Amount, BlockNumber, PoolId, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Unknown pool slot: {0}")]
    UnknownPool(PoolId),

    #[error("Withdrawal exceeds stake of {staker}: requested {requested}, staked {staked}")]
    InsufficientStake {
        staker: Address,
        requested: Amount,
        staked: Amount,
    },

    #[error("Token call failed: {0}")]
    Token(#[from] TokenError),

    #[error("Pool arithmetic failed: {0}")]
    Math(#[from] MathError),
}

impl OracleError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ExternalCall
    }
}

/// Public state of one staking pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Token staked into this slot
    pub token: Address,
    /// Share of the global emission allocated to this slot
    pub alloc_point: u128,
    /// Block at which `acc_reward_per_share` was last brought up to date
    pub last_reward_block: BlockNumber,
    /// Accumulated reward per staked unit, scaled by `ACC_REWARD_PRECISION`
    pub acc_reward_per_share: u128,
}

/// Accruing staking pool
pub trait RewardOracle: Send + Sync {
    /// Address of the staking contract
    fn address(&self) -> Address;

    /// Stake `amount` of the slot's token from `depositor`.
    ///
    /// Settles the slot first and pays `depositor` any pending reward.
    fn deposit(&self, depositor: &Address, pool: PoolId, amount: Amount)
        -> Result<(), OracleError>;

    /// Unstake `amount` back to `depositor`, paying pending reward
    fn withdraw(&self, depositor: &Address, pool: PoolId, amount: Amount)
        -> Result<(), OracleError>;

    fn pool_info(&self, pool: PoolId) -> Result<PoolInfo, OracleError>;

    /// Emission multiplier between two blocks
    fn get_multiplier(&self, from: BlockNumber, to: BlockNumber) -> u128;

    /// Reward emitted per block across all slots
    fn reward_per_block(&self) -> Amount;

    /// Sum of every slot's allocation points
    fn total_alloc_point(&self) -> u128;
}

/// Reserve balances of a liquidity pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve0: Amount,
    pub reserve1: Amount,
    pub block_timestamp_last: Timestamp,
}

/// Liquidity pair.
///
/// The pair's ownership share is itself a token, so the supply and transfer
/// interface come from [`TokenLedger`].
pub trait PairOracle: TokenLedger {
    fn token0(&self) -> Address;

    fn token1(&self) -> Address;

    fn get_reserves(&self) -> Reserves;
}
