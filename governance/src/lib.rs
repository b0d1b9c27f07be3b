//! VaultGov Governance Module
//!
//! Proposal state machine weighted by the quadratic voting power of vault
//! deposits. Each proposal commits to a single action; governers run it once
//! the proposal has passed and its execution delay has elapsed.

pub mod actions;
pub mod error;
pub mod events;
pub mod governance;
pub mod params;
pub mod proposal;

pub use actions::{ActionError, ActionHandler, ActionRegistry};
pub use error::{GovernanceError, Result};
pub use events::GovernanceEvent;
pub use governance::{Governance, GovernanceSnapshot};
pub use params::{GovernanceConfig, GovernanceParams, ParamsUpdate};
pub use proposal::{ActionCall, ActionHash, Proposal, ProposalId, ProposalState, Receipt};

/// Default governance parameters
pub mod config {
    use vaultgov_core::{Amount, DAY, TOKEN_UNIT};

    /// Shortest voting period a proposer may choose (3 days)
    pub const DEFAULT_MINIMUM_VOTING_PERIOD: u64 = 3 * DAY;

    /// Wait between the end of voting and execution (1 day)
    pub const DEFAULT_EXECUTION_DELAY: u64 = DAY;

    /// Window in which a passed proposal may be executed (7 days)
    pub const DEFAULT_EXECUTION_EXPIRATION: u64 = 7 * DAY;

    /// Supporting quadratic votes required to pass (deposits of 10,000 tokens)
    pub const DEFAULT_QUORUM: Amount = 100 * TOKEN_UNIT;

    /// Quadratic votes a proposer must exceed (deposits of 100 tokens)
    pub const DEFAULT_PROPOSAL_THRESHOLD: Amount = 10 * TOKEN_UNIT;
}
