//! Vault accounting engine
//!
//! Holds custody of two tokens: the protocol's reward token and the shares of
//! a liquidity pair that contains it. Pool tokens are staked into an external
//! reward pool; the reward it pays out is tracked per account through a
//! snapshot of `balance * acc_reward_per_share` and paid out on withdrawal.
//!
//! Voting power is the reward-token value of everything deposited, priced at
//! deposit time. Governance may freeze an account to lock that power in place
//! while it is being used for a vote.
//!
//! The pool pays reward for the vault's whole stake at once, rounding once,
//! while accounts round their share individually. Harvested reward is booked
//! into a reserve and no withdrawal pays out more staking reward than the
//! reserve holds.
//!
//! Every operation validates and computes before it touches its own records.
//! When a collaborator call has already gone through and a later step fails,
//! the matching compensating call is issued before the error is returned.

use crate::account::Account;
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::events::VaultEvent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use vaultgov_core::math;
use vaultgov_core::{
    Address, Amount, ClaimableAuthority, Clock, PairOracle, RewardOracle, Timestamp,
    TokenError, TokenLedger, ACC_REWARD_PRECISION,
};

/// External contracts a vault is wired to
#[derive(Clone)]
pub struct VaultCollaborators {
    pub reward_token: Arc<dyn TokenLedger>,
    pub pair: Arc<dyn PairOracle>,
    pub reward_pool: Arc<dyn RewardOracle>,
    pub clock: Arc<dyn Clock>,
}

/// Which side of the pair holds the reward token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveSide {
    Token0,
    Token1,
}

/// Exported ledger records of a vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub governance: Option<Address>,
    pub accounts: BTreeMap<Address, Account>,
    /// Harvested staking reward not yet paid to any account
    #[serde(default)]
    pub reward_reserve: Amount,
}

pub struct Vault {
    config: VaultConfig,
    reward_token: Arc<dyn TokenLedger>,
    pair: Arc<dyn PairOracle>,
    reward_pool: Arc<dyn RewardOracle>,
    clock: Arc<dyn Clock>,
    reward_side: ReserveSide,
    governance: ClaimableAuthority,
    accounts: HashMap<Address, Account>,
    reward_reserve: Amount,
    events: Vec<VaultEvent>,
}

impl Vault {
    /// Wire a vault to its collaborators.
    ///
    /// Fails if a collaborator's address does not match the configuration,
    /// if the staking slot does not stake the configured pair, or if the pair
    /// does not hold the reward token. Approves the reward pool for an
    /// unlimited amount of pool tokens.
    pub fn new(config: VaultConfig, collaborators: VaultCollaborators) -> Result<Self> {
        config.validate()?;

        let VaultCollaborators {
            reward_token,
            pair,
            reward_pool,
            clock,
        } = collaborators;

        check_binding("reward token", config.reward_token, reward_token.address())?;
        check_binding("pool token", config.pool_token, pair.address())?;
        check_binding("reward pool", config.reward_pool, reward_pool.address())?;

        let slot = reward_pool.pool_info(config.pool_id)?;
        check_binding("staking slot token", config.pool_token, slot.token)?;

        let reward_side = if pair.token0() == config.reward_token {
            ReserveSide::Token0
        } else if pair.token1() == config.reward_token {
            ReserveSide::Token1
        } else {
            return Err(VaultError::PairWithoutRewardToken {
                pair: config.pool_token,
                token: config.reward_token,
            });
        };

        pair.approve(&config.address, &config.reward_pool, Amount::MAX)?;

        log::info!(
            "Vault {} wired to reward token {}, pair {} ({:?}) and pool slot {}",
            config.address,
            config.reward_token,
            config.pool_token,
            reward_side,
            config.pool_id
        );

        Ok(Self {
            config,
            reward_token,
            pair,
            reward_pool,
            clock,
            reward_side,
            governance: ClaimableAuthority::new(),
            accounts: HashMap::new(),
            reward_reserve: 0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn reward_side(&self) -> ReserveSide {
        self.reward_side
    }

    pub fn governance(&self) -> Option<Address> {
        self.governance.holder()
    }

    /// Account of `owner`, zeroed if it never deposited
    pub fn account(&self, owner: &Address) -> Account {
        self.accounts.get(owner).copied().unwrap_or_default()
    }

    /// Staking reward harvested from the pool and not yet paid out
    pub fn reward_reserve(&self) -> Amount {
        self.reward_reserve
    }

    pub fn votes(&self, owner: &Address) -> Amount {
        self.account(owner).voting_power
    }

    /// `isqrt(voting_power) * quadratic_scale`
    pub fn quadratic_votes(&self, owner: &Address) -> Result<Amount> {
        let root = math::isqrt(self.votes(owner));
        Ok(math::mul(root, self.config.quadratic_scale)?)
    }

    pub fn freeze_until(&self, owner: &Address) -> Timestamp {
        self.account(owner).freeze_until
    }

    pub fn is_frozen(&self, owner: &Address) -> bool {
        self.account(owner).is_frozen(self.clock.now())
    }

    /// Hand the governance role to `new_governance`.
    ///
    /// Anyone may claim the role while it is unset.
    pub fn set_governance(&mut self, caller: &Address, new_governance: Address) -> Result<()> {
        let previous = self.governance.set(caller, new_governance)?;
        log::info!("Vault governance changed from {:?} to {}", previous, new_governance);
        self.events.push(VaultEvent::GovernanceChanged {
            previous,
            current: new_governance,
        });
        Ok(())
    }

    /// Deposit reward tokens and pool tokens from `caller`; a zero amount
    /// skips that half
    pub fn deposit(
        &mut self,
        caller: &Address,
        reward_amount: Amount,
        pool_amount: Amount,
    ) -> Result<()> {
        if reward_amount > 0 {
            self.deposit_reward_token(caller, reward_amount)?;
        }
        if pool_amount > 0 {
            if let Err(e) = self.deposit_pool_token(caller, pool_amount) {
                if reward_amount > 0 {
                    self.revert_reward_deposit(caller, reward_amount);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Pull `amount` reward tokens from `caller` into custody
    pub fn deposit_reward_token(&mut self, caller: &Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }

        let mut account = self.account(caller);
        account.reward_token_balance = math::add(account.reward_token_balance, amount)?;
        account.voting_power = math::add(account.voting_power, amount)?;

        let vault = self.config.address;
        self.reward_token.transfer_from(&vault, caller, &vault, amount)?;

        self.accounts.insert(*caller, account);
        self.events.push(VaultEvent::RewardTokenDeposited {
            owner: *caller,
            amount,
        });
        log::info!("{} deposited {} reward tokens", caller, amount);
        Ok(())
    }

    /// Pull `amount` pool tokens from `caller` and stake them.
    ///
    /// Pending reward on the existing stake is added to the account's credit
    /// before the snapshot is re-based on the new balance.
    pub fn deposit_pool_token(&mut self, caller: &Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }

        let granted_power = self.pool_token_value(amount)?;
        let vault = self.config.address;

        self.pair.transfer_from(&vault, caller, &vault, amount)?;
        if let Err(e) = self.stake(amount) {
            self.refund_pool_tokens(caller, amount);
            return Err(e);
        }

        let mut account = self.account(caller);
        let settled = match self.stage_pool_deposit(&mut account, amount, granted_power) {
            Ok(settled) => settled,
            Err(e) => {
                self.unstake_and_refund(caller, amount);
                return Err(e);
            }
        };

        self.accounts.insert(*caller, account);
        self.events.push(VaultEvent::PoolTokenDeposited {
            owner: *caller,
            amount,
            voting_power: granted_power,
            settled_reward: settled,
        });
        log::info!(
            "{} deposited {} pool tokens worth {} voting power (settled {} reward)",
            caller,
            amount,
            granted_power,
            settled
        );
        Ok(())
    }

    /// Withdraw every staked pool token, raw reward token and owed reward of
    /// `caller`. Fails while the account is frozen.
    ///
    /// Raw reward tokens are always returned in full. The staking reward part
    /// is capped at the vault's reward reserve.
    pub fn withdraw_all(&mut self, caller: &Address) -> Result<()> {
        let now = self.clock.now();
        let account = self.account(caller);
        if account.is_frozen(now) {
            log::debug!(
                "Withdrawal by {} rejected: frozen until {}",
                caller,
                account.freeze_until
            );
            return Err(VaultError::Frozen {
                owner: *caller,
                until: account.freeze_until,
                now,
            });
        }
        if account.is_empty() {
            return Ok(());
        }

        let vault = self.config.address;
        let principal = account.pool_token_balance;

        if principal > 0 {
            self.unstake(principal)?;
        }
        let (owed, reward_paid) = match self.stage_withdrawal(&account) {
            Ok(staged) => staged,
            Err(e) => {
                if principal > 0 {
                    self.restake(principal);
                }
                return Err(e);
            }
        };

        if owed > 0 {
            if let Err(e) = self.reward_token.transfer(&vault, caller, owed) {
                if principal > 0 {
                    self.restake(principal);
                }
                return Err(e.into());
            }
        }
        if principal > 0 {
            if let Err(e) = self.pair.transfer(&vault, caller, principal) {
                self.claw_back_reward(caller, owed);
                self.restake(principal);
                return Err(e.into());
            }
        }

        let mut cleared = account;
        cleared.clear_balances();
        self.accounts.insert(*caller, cleared);
        self.reward_reserve = self.reward_reserve.saturating_sub(reward_paid);
        self.events.push(VaultEvent::Withdrawn {
            owner: *caller,
            pool_tokens: principal,
            reward_tokens: owed,
        });
        log::info!(
            "{} withdrew {} pool tokens and {} reward tokens",
            caller,
            principal,
            owed
        );
        Ok(())
    }

    /// Reward tokens `owner` would receive by withdrawing now.
    ///
    /// Projects the staking slot's accumulator to the current block using its
    /// emission rate, then applies the withdrawal formula. The reserve cap is
    /// not applied, so a rounding shortfall at the pool may make this exceed
    /// the eventual payout by a few base units.
    pub fn pending_reward(&self, owner: &Address) -> Result<Amount> {
        let account = self.account(owner);
        let acc = self.projected_acc_reward_per_share()?;
        Ok(account.owed_reward(acc)?)
    }

    /// Extend the freeze of `owner` to at least `now + duration`.
    ///
    /// Governance only. Never shortens an existing freeze; a zero duration
    /// changes nothing.
    pub fn freeze(&mut self, caller: &Address, owner: &Address, duration: u64) -> Result<()> {
        self.governance.ensure(caller)?;
        if duration == 0 {
            return Ok(());
        }

        let until = math::add_secs(self.clock.now(), duration)?;
        let account = self.accounts.entry(*owner).or_default();
        if until > account.freeze_until {
            account.freeze_until = until;
            self.events.push(VaultEvent::Frozen {
                owner: *owner,
                until,
            });
            log::debug!("{} frozen until {}", owner, until);
        }
        Ok(())
    }

    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            governance: self.governance.holder(),
            accounts: self.accounts.iter().map(|(k, v)| (*k, *v)).collect(),
            reward_reserve: self.reward_reserve,
        }
    }

    /// Replace every account record and the governance role with `snapshot`
    pub fn restore(&mut self, snapshot: VaultSnapshot) {
        let mut governance = ClaimableAuthority::new();
        if let Some(holder) = snapshot.governance {
            // Claiming an unset authority cannot fail
            let _ = governance.set(&holder, holder);
        }
        self.governance = governance;
        self.accounts = snapshot.accounts.into_iter().collect();
        self.reward_reserve = snapshot.reward_reserve;
        log::info!("Vault restored with {} accounts", self.accounts.len());
    }

    /// Settle `account` against the freshly updated accumulator and add the
    /// new stake and voting power
    fn stage_pool_deposit(
        &self,
        account: &mut Account,
        amount: Amount,
        granted_power: Amount,
    ) -> Result<Amount> {
        let slot = self.reward_pool.pool_info(self.config.pool_id)?;
        let settled = account.settle_and_stake(amount, slot.acc_reward_per_share)?;
        account.voting_power = math::add(account.voting_power, granted_power)?;
        log::debug!(
            "Settled {} reward at acc/share {}",
            settled,
            slot.acc_reward_per_share
        );
        Ok(settled)
    }

    /// Total payout and the staking reward part of it for withdrawing
    /// `account`, with the reward capped at the reserve
    fn stage_withdrawal(&self, account: &Account) -> Result<(Amount, Amount)> {
        let reward_paid = if account.pool_token_balance > 0 {
            let slot = self.reward_pool.pool_info(self.config.pool_id)?;
            let earned = account.earned_reward(slot.acc_reward_per_share)?;
            if earned > self.reward_reserve {
                log::warn!(
                    "Reward of {} capped at reserve {} (pool rounding)",
                    earned,
                    self.reward_reserve
                );
            }
            earned.min(self.reward_reserve)
        } else {
            0
        };
        let owed = math::add(account.reward_token_balance, reward_paid)?;
        self.ensure_reward_reserves(owed)?;
        Ok((owed, reward_paid))
    }

    /// Stake `amount` pool tokens, booking whatever reward the pool harvests
    fn stake(&mut self, amount: Amount) -> Result<()> {
        let before = self.reward_token.balance_of(&self.config.address);
        self.reward_pool
            .deposit(&self.config.address, self.config.pool_id, amount)?;
        self.book_harvest(before);
        Ok(())
    }

    /// Unstake `amount` pool tokens, booking whatever reward the pool harvests
    fn unstake(&mut self, amount: Amount) -> Result<()> {
        let before = self.reward_token.balance_of(&self.config.address);
        self.reward_pool
            .withdraw(&self.config.address, self.config.pool_id, amount)?;
        self.book_harvest(before);
        Ok(())
    }

    fn book_harvest(&mut self, balance_before: Amount) {
        let harvested = self
            .reward_token
            .balance_of(&self.config.address)
            .saturating_sub(balance_before);
        if harvested > 0 {
            self.reward_reserve = self.reward_reserve.saturating_add(harvested);
            log::debug!(
                "Harvested {} reward, reserve now {}",
                harvested,
                self.reward_reserve
            );
        }
    }

    /// Reward-token value of `amount` pool tokens at the current reserves
    fn pool_token_value(&self, amount: Amount) -> Result<Amount> {
        let reserves = self.pair.get_reserves();
        let reserve = match self.reward_side {
            ReserveSide::Token0 => reserves.reserve0,
            ReserveSide::Token1 => reserves.reserve1,
        };
        Ok(math::mul_div(amount, reserve, self.pair.total_supply())?)
    }

    fn projected_acc_reward_per_share(&self) -> Result<u128> {
        let slot = self.reward_pool.pool_info(self.config.pool_id)?;
        let block = self.clock.block_number();
        let staked = self.pair.balance_of(&self.reward_pool.address());
        let total_alloc = self.reward_pool.total_alloc_point();

        if block <= slot.last_reward_block || staked == 0 || total_alloc == 0 {
            return Ok(slot.acc_reward_per_share);
        }

        let multiplier = self
            .reward_pool
            .get_multiplier(slot.last_reward_block, block);
        let reward = math::mul_div(
            math::mul(multiplier, self.reward_pool.reward_per_block())?,
            slot.alloc_point,
            total_alloc,
        )?;
        let increment = math::mul_div(reward, ACC_REWARD_PRECISION, staked)?;
        Ok(math::add(slot.acc_reward_per_share, increment)?)
    }

    fn ensure_reward_reserves(&self, owed: Amount) -> Result<()> {
        let held = self.reward_token.balance_of(&self.config.address);
        if held < owed {
            return Err(TokenError::InsufficientBalance {
                holder: self.config.address,
                requested: owed,
                available: held,
            }
            .into());
        }
        Ok(())
    }

    fn revert_reward_deposit(&mut self, caller: &Address, amount: Amount) {
        if let Some(account) = self.accounts.get_mut(caller) {
            match (
                math::sub(account.reward_token_balance, amount),
                math::sub(account.voting_power, amount),
            ) {
                (Ok(balance), Ok(power)) => {
                    account.reward_token_balance = balance;
                    account.voting_power = power;
                }
                _ => log::warn!("Reverting {} reward tokens for {} underflowed", amount, caller),
            }
        }
        if let Some(pos) = self.events.iter().rposition(|e| {
            matches!(e, VaultEvent::RewardTokenDeposited { owner, .. } if owner == caller)
        }) {
            self.events.remove(pos);
        }
        if let Err(e) = self.reward_token.transfer(&self.config.address, caller, amount) {
            log::warn!("Refund of {} reward tokens to {} failed: {}", amount, caller, e);
        }
    }

    fn refund_pool_tokens(&self, caller: &Address, amount: Amount) {
        if let Err(e) = self.pair.transfer(&self.config.address, caller, amount) {
            log::warn!("Refund of {} pool tokens to {} failed: {}", amount, caller, e);
        }
    }

    fn unstake_and_refund(&mut self, caller: &Address, amount: Amount) {
        match self.unstake(amount) {
            Ok(()) => self.refund_pool_tokens(caller, amount),
            Err(e) => log::warn!("Unstaking {} pool tokens for refund failed: {}", amount, e),
        }
    }

    fn restake(&mut self, amount: Amount) {
        if let Err(e) = self.stake(amount) {
            log::warn!("Re-staking {} pool tokens failed: {}", amount, e);
        }
    }

    fn claw_back_reward(&self, caller: &Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        if let Err(e) = self
            .reward_token
            .transfer(caller, &self.config.address, amount)
        {
            log::warn!("Reclaiming {} reward tokens from {} failed: {}", amount, caller, e);
        }
    }
}

fn check_binding(component: &'static str, expected: Address, actual: Address) -> Result<()> {
    if expected != actual {
        return Err(VaultError::CollaboratorMismatch {
            component,
            expected,
            actual,
        });
    }
    Ok(())
}
