//! Ledger-visible vault events

use serde::{Deserialize, Serialize};
use vaultgov_core::{Address, Amount, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    RewardTokenDeposited {
        owner: Address,
        amount: Amount,
    },
    PoolTokenDeposited {
        owner: Address,
        amount: Amount,
        /// Voting power granted for the deposit
        voting_power: Amount,
        /// Pending reward moved into the account's credit
        settled_reward: Amount,
    },
    Withdrawn {
        owner: Address,
        pool_tokens: Amount,
        reward_tokens: Amount,
    },
    Frozen {
        owner: Address,
        until: Timestamp,
    },
    GovernanceChanged {
        previous: Option<Address>,
        current: Address,
    },
}
