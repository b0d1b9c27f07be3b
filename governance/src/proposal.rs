//! Proposal records and the lifecycle derived from them

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;
use std::fmt;
use vaultgov_core::{Address, Amount, Timestamp};

use crate::params::GovernanceParams;

/// Sequential proposal id, starting at 1
pub type ProposalId = u64;

/// Commitment to an exact action call
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionHash(pub [u8; 32]);

impl fmt::Display for ActionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ActionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionHash({})", self)
    }
}

/// Call a proposal authorizes: `value` and `data` handed to the handler
/// registered for `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCall {
    pub target: Address,
    pub value: Amount,
    pub data: Vec<u8>,
}

impl ActionCall {
    pub fn new(target: Address, value: Amount, data: impl Into<Vec<u8>>) -> Self {
        Self {
            target,
            value,
            data: data.into(),
        }
    }

    /// SHA3-256 over `target || value (big-endian) || data`
    pub fn hash(&self) -> ActionHash {
        let mut hasher = Sha3_256::new();
        hasher.update(self.target.as_bytes());
        hasher.update(self.value.to_be_bytes());
        hasher.update(&self.data);
        ActionHash(hasher.finalize().into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// Voting window open
    Active,
    /// Quorum missed or not more for than against
    Defeated,
    /// Passed; waiting out the execution delay
    PendingExecution,
    ReadyForExecution,
    Executed,
    /// Passed but never executed within the execution window
    Vetoed,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalState::Active => "Active",
            ProposalState::Defeated => "Defeated",
            ProposalState::PendingExecution => "PendingExecution",
            ProposalState::ReadyForExecution => "ReadyForExecution",
            ProposalState::Executed => "Executed",
            ProposalState::Vetoed => "Vetoed",
        };
        write!(f, "{}", name)
    }
}

/// A voter's single, permanent ballot on one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub has_voted: bool,
    pub support: bool,
    /// Quadratic voting power counted for the ballot
    pub votes: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub proposer: Address,
    /// Governer that executed the proposal
    pub executor: Option<Address>,
    pub executed_at: Option<Timestamp>,
    pub start_time: Timestamp,
    pub voting_period: u64,
    pub for_votes: Amount,
    pub against_votes: Amount,
    pub action_hash: ActionHash,
    pub receipts: BTreeMap<Address, Receipt>,
}

impl Proposal {
    pub fn new(
        id: ProposalId,
        title: String,
        proposer: Address,
        start_time: Timestamp,
        voting_period: u64,
        action_hash: ActionHash,
    ) -> Self {
        Self {
            id,
            title,
            proposer,
            executor: None,
            executed_at: None,
            start_time,
            voting_period,
            for_votes: 0,
            against_votes: 0,
            action_hash,
            receipts: BTreeMap::new(),
        }
    }

    pub fn is_executed(&self) -> bool {
        self.executor.is_some()
    }

    /// First second after the voting window
    pub fn voting_end(&self) -> Timestamp {
        self.start_time.saturating_add(self.voting_period)
    }

    pub fn receipt(&self, voter: &Address) -> Option<Receipt> {
        self.receipts.get(voter).copied()
    }

    /// Lifecycle state at `now`.
    ///
    /// Checks run in a fixed order and the first match wins: voting window,
    /// executed flag, quorum and majority, execution delay, execution window.
    /// Window bounds that would pass `Timestamp::MAX` never close.
    pub fn state_at(&self, now: Timestamp, params: &GovernanceParams) -> ProposalState {
        let voting_end = self.voting_end();
        if now < voting_end {
            return ProposalState::Active;
        }
        if self.is_executed() {
            return ProposalState::Executed;
        }
        if self.for_votes < params.quorum || self.for_votes <= self.against_votes {
            return ProposalState::Defeated;
        }

        let ready_at = voting_end.saturating_add(params.execution_delay);
        if now < ready_at {
            return ProposalState::PendingExecution;
        }
        if now < ready_at.saturating_add(params.execution_expiration) {
            return ProposalState::ReadyForExecution;
        }
        ProposalState::Vetoed
    }
}
