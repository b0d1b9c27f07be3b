//! Ledger-visible governance events

use crate::params::GovernanceParams;
use crate::proposal::{ActionHash, ProposalId};
use serde::{Deserialize, Serialize};
use vaultgov_core::{Address, Amount, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    ProposalCreated {
        id: ProposalId,
        proposer: Address,
        title: String,
        start_time: Timestamp,
        voting_period: u64,
        action_hash: ActionHash,
    },
    VoteCast {
        id: ProposalId,
        voter: Address,
        support: bool,
        votes: Amount,
    },
    ProposalExecuted {
        id: ProposalId,
        executor: Address,
    },
    ParamsUpdated(GovernanceParams),
    GovernerAdded {
        governer: Address,
        by: Address,
    },
    GovernerRemoved {
        governer: Address,
        by: Address,
    },
    ActionRegistered {
        target: Address,
    },
    ActionUnregistered {
        target: Address,
    },
}
