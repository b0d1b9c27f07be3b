//! Governance error types

use crate::actions::ActionError;
use crate::proposal::{ActionHash, ProposalId, ProposalState};
use thiserror::Error;
use vaultgov_core::{AccessError, Address, Amount, ConfigError, ErrorKind, MathError};
use vaultgov_vault::VaultError;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Voting power of {proposer} is {votes}, proposals require more than {threshold}")]
    BelowProposalThreshold {
        proposer: Address,
        votes: Amount,
        threshold: Amount,
    },

    #[error("Voting period of {requested}s is below the minimum of {minimum}s")]
    VotingPeriodTooShort { requested: u64, minimum: u64 },

    #[error("Proposal {id} is {actual}, expected {expected}")]
    UnexpectedState {
        id: ProposalId,
        expected: ProposalState,
        actual: ProposalState,
    },

    #[error("{voter} already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, voter: Address },

    #[error("{voter} has no voting power")]
    NoVotingPower { voter: Address },

    #[error("Action does not match proposal {id}: committed {expected}, supplied {actual}")]
    ActionMismatch {
        id: ProposalId,
        expected: ActionHash,
        actual: ActionHash,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ConfigError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Vault call failed: {0}")]
    Vault(#[from] VaultError),

    #[error("Action failed: {0}")]
    Action(#[from] ActionError),

    #[error("Arithmetic error: {0}")]
    Math(#[from] MathError),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::ProposalNotFound(_) | GovernanceError::ActionMismatch { .. } => {
                ErrorKind::Integrity
            }
            GovernanceError::BelowProposalThreshold { .. }
            | GovernanceError::VotingPeriodTooShort { .. }
            | GovernanceError::UnexpectedState { .. }
            | GovernanceError::AlreadyVoted { .. }
            | GovernanceError::NoVotingPower { .. } => ErrorKind::Precondition,
            GovernanceError::InvalidParams(e) => e.kind(),
            GovernanceError::Access(e) => e.kind(),
            GovernanceError::Vault(e) => e.kind(),
            GovernanceError::Action(e) => e.kind(),
            GovernanceError::Math(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
