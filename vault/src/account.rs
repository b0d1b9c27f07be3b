//! Per-depositor account record

use serde::{Deserialize, Serialize};
use vaultgov_core::math;
use vaultgov_core::{Amount, MathError, Timestamp, ACC_REWARD_PRECISION};

/// Ledger record of a single depositor.
///
/// Created zeroed on first touch and never removed; a full withdrawal zeroes
/// every balance but keeps the freeze deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Raw deposited reward tokens, withdrawable 1:1
    pub reward_token_balance: Amount,
    /// Pool tokens currently staked with the reward pool
    pub pool_token_balance: Amount,
    /// Reward settled on earlier deposits but not yet paid out
    pub reward_credit: Amount,
    /// `pool_token_balance * acc_reward_per_share / PRECISION` at the last settlement
    pub reward_snapshot: Amount,
    /// Reward tokens plus pool tokens valued in reward tokens at deposit time
    pub voting_power: Amount,
    /// Withdrawal is blocked while `now < freeze_until`
    pub freeze_until: Timestamp,
}

impl Account {
    pub fn is_empty(&self) -> bool {
        self.reward_token_balance == 0 && self.pool_token_balance == 0
    }

    pub fn is_frozen(&self, now: Timestamp) -> bool {
        now < self.freeze_until
    }

    /// Reward accrued on the staked balance since the last settlement
    pub fn accrued_since_snapshot(&self, acc_reward_per_share: u128) -> Result<Amount, MathError> {
        let gross = math::mul_div(
            self.pool_token_balance,
            acc_reward_per_share,
            ACC_REWARD_PRECISION,
        )?;
        math::sub(gross, self.reward_snapshot)
    }

    /// Staking reward owed at `acc_reward_per_share`, excluding raw deposits
    pub fn earned_reward(&self, acc_reward_per_share: u128) -> Result<Amount, MathError> {
        let accrued = self.accrued_since_snapshot(acc_reward_per_share)?;
        math::add(accrued, self.reward_credit)
    }

    /// Everything the account is owed in reward tokens at `acc_reward_per_share`
    pub fn owed_reward(&self, acc_reward_per_share: u128) -> Result<Amount, MathError> {
        math::add(
            self.earned_reward(acc_reward_per_share)?,
            self.reward_token_balance,
        )
    }

    /// Move pending reward into the credit and re-baseline the snapshot after
    /// adding `amount` pool tokens
    pub fn settle_and_stake(
        &mut self,
        amount: Amount,
        acc_reward_per_share: u128,
    ) -> Result<Amount, MathError> {
        let accrued = if self.pool_token_balance > 0 {
            self.accrued_since_snapshot(acc_reward_per_share)?
        } else {
            0
        };
        self.reward_credit = math::add(self.reward_credit, accrued)?;
        self.pool_token_balance = math::add(self.pool_token_balance, amount)?;
        self.reward_snapshot =
            math::mul_div(self.pool_token_balance, acc_reward_per_share, ACC_REWARD_PRECISION)?;
        Ok(accrued)
    }

    /// Zero every balance, keeping the freeze deadline
    pub fn clear_balances(&mut self) {
        *self = Account {
            freeze_until: self.freeze_until,
            ..Account::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u128 = ACC_REWARD_PRECISION;

    #[test]
    fn test_settlement_is_additive() {
        let mut account = Account::default();

        assert_eq!(account.settle_and_stake(100, 0).unwrap(), 0);
        assert_eq!(account.reward_snapshot, 0);

        // acc rises to 2.0 per share: 200 accrued
        assert_eq!(account.settle_and_stake(100, 2 * P).unwrap(), 200);
        assert_eq!(account.reward_credit, 200);
        assert_eq!(account.reward_snapshot, 400);

        // acc rises to 3.0: 200 * 1.0 more, added on top of the earlier credit
        assert_eq!(account.settle_and_stake(50, 3 * P).unwrap(), 200);
        assert_eq!(account.reward_credit, 400);
        assert_eq!(account.pool_token_balance, 250);
        assert_eq!(account.reward_snapshot, 750);
    }

    #[test]
    fn test_owed_reward_includes_raw_deposits() {
        let account = Account {
            reward_token_balance: 1_000,
            pool_token_balance: 10,
            reward_credit: 7,
            reward_snapshot: 20,
            ..Account::default()
        };
        // 10 * 5.0 - 20 + 7 + 1000
        assert_eq!(account.owed_reward(5 * P).unwrap(), 1_037);
    }

    #[test]
    fn test_snapshot_above_accrual_underflows() {
        let account = Account {
            pool_token_balance: 10,
            reward_snapshot: 100,
            ..Account::default()
        };
        assert!(matches!(
            account.owed_reward(P),
            Err(MathError::Underflow { .. })
        ));
    }

    #[test]
    fn test_clear_keeps_freeze() {
        let mut account = Account {
            reward_token_balance: 5,
            voting_power: 5,
            freeze_until: 99,
            ..Account::default()
        };
        account.clear_balances();
        assert!(account.is_empty());
        assert_eq!(account.voting_power, 0);
        assert_eq!(account.freeze_until, 99);
        assert!(account.is_frozen(98));
        assert!(!account.is_frozen(99));
    }
}
