//! Allocation-weighted staking pool
//!
//! Emits `reward_per_block` across all pool slots in proportion to their
//! allocation points. Each slot keeps an accumulated-reward-per-share counter
//! (scaled by [`ACC_REWARD_PRECISION`]); stakers carry a reward debt and are
//! paid their pending reward whenever they deposit or withdraw.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use vaultgov_core::math;
use vaultgov_core::{
    Address, Amount, BlockNumber, Clock, InMemoryToken, OracleError, PoolId, PoolInfo,
    RewardOracle, TokenLedger, ACC_REWARD_PRECISION,
};

use crate::constants::{DEFAULT_BONUS_MULTIPLIER, DEFAULT_REWARD_PER_BLOCK};

/// Emission parameters of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    pub reward_per_block: Amount,
    pub start_block: BlockNumber,
    /// Blocks before this height emit `bonus_multiplier` times the base rate
    pub bonus_end_block: BlockNumber,
    pub bonus_multiplier: u128,
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        Self {
            reward_per_block: DEFAULT_REWARD_PER_BLOCK,
            start_block: 0,
            bonus_end_block: 0,
            bonus_multiplier: DEFAULT_BONUS_MULTIPLIER,
        }
    }
}

impl EmissionSchedule {
    /// Emission multiplier over `[from, to)`
    pub fn multiplier(&self, from: BlockNumber, to: BlockNumber) -> u128 {
        if to <= from {
            return 0;
        }
        let (from, to) = (from as u128, to as u128);
        let bonus_end = self.bonus_end_block as u128;

        if to <= bonus_end {
            (to - from) * self.bonus_multiplier
        } else if from >= bonus_end {
            to - from
        } else {
            (bonus_end - from) * self.bonus_multiplier + (to - bonus_end)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StakerInfo {
    amount: Amount,
    reward_debt: Amount,
}

struct PoolSlot {
    info: PoolInfo,
    token: Arc<dyn TokenLedger>,
}

#[derive(Default)]
struct FarmState {
    pools: Vec<PoolSlot>,
    stakers: HashMap<(PoolId, Address), StakerInfo>,
    total_alloc_point: u128,
}

/// In-memory accruing staking pool
pub struct SimulatedRewardPool {
    address: Address,
    reward_token: InMemoryToken,
    clock: Arc<dyn Clock>,
    schedule: EmissionSchedule,
    state: RwLock<FarmState>,
}

impl SimulatedRewardPool {
    /// Create a pool that mints `reward_token` as emission
    pub fn new(
        address: Address,
        reward_token: InMemoryToken,
        clock: Arc<dyn Clock>,
        schedule: EmissionSchedule,
    ) -> Self {
        Self {
            address,
            reward_token,
            clock,
            schedule,
            state: RwLock::new(FarmState::default()),
        }
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    /// Open a new slot staking `token` with the given allocation
    pub fn add_pool(&self, alloc_point: u128, token: Arc<dyn TokenLedger>) -> PoolId {
        let block = self.clock.block_number();
        let mut state = self.state.write();

        // Bring every slot up to date before the allocation shares change
        for pid in 0..state.pools.len() {
            // Existing slots were validated when they were added
            let _ = self.update_slot(&mut state, pid as PoolId, block);
        }

        let pid = state.pools.len() as PoolId;
        state.total_alloc_point += alloc_point;
        state.pools.push(PoolSlot {
            info: PoolInfo {
                token: token.address(),
                alloc_point,
                last_reward_block: block.max(self.schedule.start_block),
                acc_reward_per_share: 0,
            },
            token,
        });

        log::info!("Staking pool slot {} opened with {} alloc points", pid, alloc_point);
        pid
    }

    /// Change a slot's allocation
    pub fn set_alloc_point(&self, pool: PoolId, alloc_point: u128) -> Result<(), OracleError> {
        let block = self.clock.block_number();
        let mut state = self.state.write();
        for pid in 0..state.pools.len() {
            self.update_slot(&mut state, pid as PoolId, block)?;
        }

        let slot = state
            .pools
            .get_mut(pool as usize)
            .ok_or(OracleError::UnknownPool(pool))?;
        let previous = slot.info.alloc_point;
        slot.info.alloc_point = alloc_point;
        state.total_alloc_point = state.total_alloc_point - previous + alloc_point;
        Ok(())
    }

    /// Amount `staker` has staked in `pool`
    pub fn staked(&self, pool: PoolId, staker: &Address) -> Amount {
        self.state
            .read()
            .stakers
            .get(&(pool, *staker))
            .map(|s| s.amount)
            .unwrap_or(0)
    }

    /// Settle a slot up to the current block
    pub fn update_pool(&self, pool: PoolId) -> Result<(), OracleError> {
        let block = self.clock.block_number();
        let mut state = self.state.write();
        self.update_slot(&mut state, pool, block)
    }

    fn update_slot(
        &self,
        state: &mut FarmState,
        pool: PoolId,
        block: BlockNumber,
    ) -> Result<(), OracleError> {
        let total_alloc = state.total_alloc_point;
        let slot = state
            .pools
            .get_mut(pool as usize)
            .ok_or(OracleError::UnknownPool(pool))?;

        if block <= slot.info.last_reward_block {
            return Ok(());
        }

        let staked_supply = slot.token.balance_of(&self.address);
        if staked_supply == 0 || total_alloc == 0 {
            slot.info.last_reward_block = block;
            return Ok(());
        }

        let multiplier = self.schedule.multiplier(slot.info.last_reward_block, block);
        let reward = math::mul_div(
            math::mul(multiplier, self.schedule.reward_per_block)?,
            slot.info.alloc_point,
            total_alloc,
        )?;

        self.reward_token.mint(&self.address, reward)?;

        let increment = math::mul_div(reward, ACC_REWARD_PRECISION, staked_supply)?;
        slot.info.acc_reward_per_share = math::add(slot.info.acc_reward_per_share, increment)?;
        slot.info.last_reward_block = block;

        log::debug!(
            "Slot {} settled to block {}: +{} reward, acc/share {}",
            pool,
            block,
            reward,
            slot.info.acc_reward_per_share
        );
        Ok(())
    }

    /// Pay `amount` of reward, capped at what the pool holds
    fn pay_reward(&self, to: &Address, amount: Amount) -> Result<(), OracleError> {
        let held = self.reward_token.balance_of(&self.address);
        let payout = amount.min(held);
        if payout > 0 {
            self.reward_token.transfer(&self.address, to, payout)?;
        }
        Ok(())
    }

    fn pending_of(staker: &StakerInfo, acc: u128) -> Result<Amount, OracleError> {
        let accrued = math::mul_div(staker.amount, acc, ACC_REWARD_PRECISION)?;
        Ok(math::sub(accrued, staker.reward_debt)?)
    }
}

impl RewardOracle for SimulatedRewardPool {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(
        &self,
        depositor: &Address,
        pool: PoolId,
        amount: Amount,
    ) -> Result<(), OracleError> {
        let block = self.clock.block_number();
        let mut state = self.state.write();
        self.update_slot(&mut state, pool, block)?;

        let slot = &state.pools[pool as usize];
        let acc = slot.info.acc_reward_per_share;
        let token = Arc::clone(&slot.token);
        let staker = state
            .stakers
            .get(&(pool, *depositor))
            .copied()
            .unwrap_or_default();

        let pending = Self::pending_of(&staker, acc)?;
        let new_amount = math::add(staker.amount, amount)?;
        let reward_debt = math::mul_div(new_amount, acc, ACC_REWARD_PRECISION)?;

        if amount > 0 {
            token.transfer_from(&self.address, depositor, &self.address, amount)?;
        }
        self.pay_reward(depositor, pending)?;

        state.stakers.insert(
            (pool, *depositor),
            StakerInfo {
                amount: new_amount,
                reward_debt,
            },
        );

        log::debug!("{} staked {} into slot {} (harvested {})", depositor, amount, pool, pending);
        Ok(())
    }

    fn withdraw(
        &self,
        depositor: &Address,
        pool: PoolId,
        amount: Amount,
    ) -> Result<(), OracleError> {
        let block = self.clock.block_number();
        let mut state = self.state.write();
        self.update_slot(&mut state, pool, block)?;

        let staker = state
            .stakers
            .get(&(pool, *depositor))
            .copied()
            .unwrap_or_default();
        if staker.amount < amount {
            return Err(OracleError::InsufficientStake {
                staker: *depositor,
                requested: amount,
                staked: staker.amount,
            });
        }

        let slot = &state.pools[pool as usize];
        let acc = slot.info.acc_reward_per_share;
        let token = Arc::clone(&slot.token);

        let pending = Self::pending_of(&staker, acc)?;
        let new_amount = staker.amount - amount;
        let reward_debt = math::mul_div(new_amount, acc, ACC_REWARD_PRECISION)?;

        if amount > 0 {
            token.transfer(&self.address, depositor, amount)?;
        }
        self.pay_reward(depositor, pending)?;

        state.stakers.insert(
            (pool, *depositor),
            StakerInfo {
                amount: new_amount,
                reward_debt,
            },
        );

        log::debug!("{} unstaked {} from slot {} (harvested {})", depositor, amount, pool, pending);
        Ok(())
    }

    fn pool_info(&self, pool: PoolId) -> Result<PoolInfo, OracleError> {
        self.state
            .read()
            .pools
            .get(pool as usize)
            .map(|slot| slot.info)
            .ok_or(OracleError::UnknownPool(pool))
    }

    fn get_multiplier(&self, from: BlockNumber, to: BlockNumber) -> u128 {
        self.schedule.multiplier(from, to)
    }

    fn reward_per_block(&self) -> Amount {
        self.schedule.reward_per_block
    }

    fn total_alloc_point(&self) -> u128 {
        self.state.read().total_alloc_point
    }
}
