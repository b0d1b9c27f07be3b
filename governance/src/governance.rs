//! Proposal state machine
//!
//! Proposals are created by holders whose quadratic voting power exceeds the
//! proposal threshold, collect one weighted ballot per voter while active, and
//! may be executed exactly once by a governer inside the execution window.
//!
//! Proposing and voting freeze the caller's vault funds for the rest of the
//! voting window, so the power counted for a ballot cannot be withdrawn and
//! re-deposited under another address while the vote is open.

use crate::actions::{ActionHandler, ActionRegistry};
use crate::error::{GovernanceError, Result};
use crate::events::GovernanceEvent;
use crate::params::{GovernanceConfig, GovernanceParams, ParamsUpdate};
use crate::proposal::{ActionCall, Proposal, ProposalId, ProposalState, Receipt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vaultgov_core::math;
use vaultgov_core::{Address, Clock, GovernerSet, Timestamp};
use vaultgov_vault::VotingEscrow;

/// Exported ledger records of a governance module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub governers: Vec<Address>,
    pub params: GovernanceParams,
    pub proposals: Vec<Proposal>,
}

pub struct Governance {
    address: Address,
    governers: GovernerSet,
    params: GovernanceParams,
    vault: Arc<dyn VotingEscrow>,
    clock: Arc<dyn Clock>,
    actions: ActionRegistry,
    proposals: Vec<Proposal>,
    events: Vec<GovernanceEvent>,
}

impl Governance {
    pub fn new(
        config: GovernanceConfig,
        vault: Arc<dyn VotingEscrow>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.params.validate()?;
        let governers = GovernerSet::new(config.governers)?;

        log::info!(
            "Governance {} started with {} governers",
            config.address,
            governers.len()
        );

        Ok(Self {
            address: config.address,
            governers,
            params: config.params,
            vault,
            clock,
            actions: ActionRegistry::new(),
            proposals: Vec::new(),
            events: Vec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn governers(&self) -> Vec<Address> {
        self.governers.members().copied().collect()
    }

    pub fn is_governer(&self, address: &Address) -> bool {
        self.governers.contains(address)
    }

    pub fn proposal_count(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        let index = id.checked_sub(1)?;
        self.proposals.get(index as usize)
    }

    pub fn receipt(&self, id: ProposalId, voter: &Address) -> Option<Receipt> {
        self.proposal(id)?.receipt(voter)
    }

    pub fn action_targets(&self) -> Vec<Address> {
        self.actions.targets()
    }

    /// Current lifecycle state of proposal `id`
    pub fn state(&self, id: ProposalId) -> Result<ProposalState> {
        let proposal = self.get(id)?;
        Ok(proposal.state_at(self.clock.now(), &self.params))
    }

    /// Open a proposal committing to `action`.
    ///
    /// The proposer's quadratic voting power must exceed the proposal
    /// threshold. Their vault funds are frozen for the voting period.
    pub fn propose(
        &mut self,
        caller: &Address,
        title: impl Into<String>,
        voting_period: u64,
        action: &ActionCall,
    ) -> Result<ProposalId> {
        if voting_period < self.params.minimum_voting_period {
            return Err(GovernanceError::VotingPeriodTooShort {
                requested: voting_period,
                minimum: self.params.minimum_voting_period,
            });
        }

        let votes = self.vault.quadratic_votes(caller)?;
        if votes <= self.params.proposal_threshold {
            log::debug!(
                "Proposal by {} rejected: {} votes, threshold {}",
                caller,
                votes,
                self.params.proposal_threshold
            );
            return Err(GovernanceError::BelowProposalThreshold {
                proposer: *caller,
                votes,
                threshold: self.params.proposal_threshold,
            });
        }

        let now = self.clock.now();
        // The voting window must end inside the clock's range
        math::add_secs(now, voting_period)?;

        self.vault.freeze(&self.address, caller, voting_period)?;

        let id = self.proposal_count() + 1;
        let proposal = Proposal::new(id, title.into(), *caller, now, voting_period, action.hash());

        log::info!(
            "Proposal {} \"{}\" opened by {} until {} (action {})",
            id,
            proposal.title,
            caller,
            proposal.voting_end(),
            proposal.action_hash
        );
        self.events.push(GovernanceEvent::ProposalCreated {
            id,
            proposer: *caller,
            title: proposal.title.clone(),
            start_time: now,
            voting_period,
            action_hash: proposal.action_hash,
        });
        self.proposals.push(proposal);
        Ok(id)
    }

    /// Cast the caller's ballot on an active proposal.
    ///
    /// Counts the caller's quadratic voting power at the time of the vote and
    /// freezes their vault funds until the voting window closes.
    pub fn vote(&mut self, caller: &Address, id: ProposalId, support: bool) -> Result<()> {
        let now = self.clock.now();
        let proposal = self.get(id)?;

        let state = proposal.state_at(now, &self.params);
        if state != ProposalState::Active {
            return Err(GovernanceError::UnexpectedState {
                id,
                expected: ProposalState::Active,
                actual: state,
            });
        }
        if proposal.receipts.contains_key(caller) {
            return Err(GovernanceError::AlreadyVoted { id, voter: *caller });
        }

        let votes = self.vault.quadratic_votes(caller)?;
        if votes == 0 {
            return Err(GovernanceError::NoVotingPower { voter: *caller });
        }

        let (for_votes, against_votes) = if support {
            (math::add(proposal.for_votes, votes)?, proposal.against_votes)
        } else {
            (proposal.for_votes, math::add(proposal.against_votes, votes)?)
        };
        let remaining = proposal.voting_end() - now;

        self.vault.freeze(&self.address, caller, remaining)?;

        let proposal = self.get_mut(id)?;
        proposal.for_votes = for_votes;
        proposal.against_votes = against_votes;
        proposal.receipts.insert(
            *caller,
            Receipt {
                has_voted: true,
                support,
                votes,
            },
        );

        log::info!(
            "{} voted {} on proposal {} with {} votes",
            caller,
            if support { "for" } else { "against" },
            id,
            votes
        );
        self.events.push(GovernanceEvent::VoteCast {
            id,
            voter: *caller,
            support,
            votes,
        });
        Ok(())
    }

    /// Execute a passed proposal's action and return the handler's output.
    ///
    /// The supplied action must match the proposal's commitment; this is
    /// checked before the caller's authority. Nothing is recorded unless the
    /// handler succeeds.
    pub fn execute(
        &mut self,
        caller: &Address,
        id: ProposalId,
        action: &ActionCall,
    ) -> Result<Vec<u8>> {
        let now = self.clock.now();
        let proposal = self.get(id)?;

        let supplied = action.hash();
        if supplied != proposal.action_hash {
            log::warn!("Execution of proposal {} with a mismatching action refused", id);
            return Err(GovernanceError::ActionMismatch {
                id,
                expected: proposal.action_hash,
                actual: supplied,
            });
        }

        self.governers.ensure(caller)?;

        let state = proposal.state_at(now, &self.params);
        if state != ProposalState::ReadyForExecution {
            return Err(GovernanceError::UnexpectedState {
                id,
                expected: ProposalState::ReadyForExecution,
                actual: state,
            });
        }

        let output = self
            .actions
            .dispatch(&action.target, action.value, &action.data)?;

        let proposal = self.get_mut(id)?;
        proposal.executor = Some(*caller);
        proposal.executed_at = Some(now);

        log::info!("Proposal {} executed by {}", id, caller);
        self.events.push(GovernanceEvent::ProposalExecuted {
            id,
            executor: *caller,
        });
        Ok(output)
    }

    /// Apply a partial parameter update. Governers only.
    pub fn update_params(&mut self, caller: &Address, update: ParamsUpdate) -> Result<()> {
        self.governers.ensure(caller)?;
        let params = self.params.merged(&update);
        params.validate()?;

        self.params = params;
        log::info!("Governance parameters updated by {}: {:?}", caller, params);
        self.events.push(GovernanceEvent::ParamsUpdated(params));
        Ok(())
    }

    pub fn add_governer(&mut self, caller: &Address, governer: Address) -> Result<()> {
        self.governers.add(caller, governer)?;
        log::info!("Governer {} added by {}", governer, caller);
        self.events.push(GovernanceEvent::GovernerAdded {
            governer,
            by: *caller,
        });
        Ok(())
    }

    pub fn remove_governer(&mut self, caller: &Address, governer: &Address) -> Result<()> {
        self.governers.remove(caller, governer)?;
        log::info!("Governer {} removed by {}", governer, caller);
        self.events.push(GovernanceEvent::GovernerRemoved {
            governer: *governer,
            by: *caller,
        });
        Ok(())
    }

    /// Bind `target` to `handler` for future executions. Governers only.
    pub fn register_action(
        &mut self,
        caller: &Address,
        target: Address,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<()> {
        self.governers.ensure(caller)?;
        self.actions.register(target, handler)?;
        log::info!("Action handler registered for {}", target);
        self.events.push(GovernanceEvent::ActionRegistered { target });
        Ok(())
    }

    pub fn unregister_action(&mut self, caller: &Address, target: &Address) -> Result<()> {
        self.governers.ensure(caller)?;
        self.actions.unregister(target)?;
        log::info!("Action handler for {} removed", target);
        self.events.push(GovernanceEvent::ActionUnregistered { target: *target });
        Ok(())
    }

    pub fn events(&self) -> &[GovernanceEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            governers: self.governers(),
            params: self.params,
            proposals: self.proposals.clone(),
        }
    }

    /// Replace the governer set, parameters and proposal records.
    ///
    /// Proposal ids must run densely from 1.
    pub fn restore(&mut self, snapshot: GovernanceSnapshot) -> Result<()> {
        snapshot.params.validate()?;
        let governers = GovernerSet::new(snapshot.governers)?;
        if let Some((index, proposal)) = snapshot
            .proposals
            .iter()
            .enumerate()
            .find(|(index, p)| p.id != *index as u64 + 1)
        {
            log::warn!("Snapshot proposal at position {} has id {}", index, proposal.id);
            return Err(GovernanceError::ProposalNotFound(index as u64 + 1));
        }

        self.governers = governers;
        self.params = snapshot.params;
        self.proposals = snapshot.proposals;
        log::info!("Governance restored with {} proposals", self.proposals.len());
        Ok(())
    }

    /// Seconds until voting on `id` closes, zero once it has
    pub fn time_remaining(&self, id: ProposalId) -> Result<u64> {
        let end: Timestamp = self.get(id)?.voting_end();
        Ok(end.saturating_sub(self.clock.now()))
    }

    fn get(&self, id: ProposalId) -> Result<&Proposal> {
        self.proposal(id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal> {
        let index = id
            .checked_sub(1)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        self.proposals
            .get_mut(index as usize)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }
}
