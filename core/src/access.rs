//! Access control
//!
//! Two independent authority schemes:
//! - [`ClaimableAuthority`]: a single address, claimable by anyone while unset
//!   and afterwards transferable only by its current holder.
//! - [`GovernerSet`]: a set of addresses that manage their own membership.

use crate::error::ErrorKind;
use crate::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Caller {caller} is not the governance address")]
    NotGovernance { caller: Address },

    #[error("Governance address has not been claimed")]
    GovernanceUnset,

    #[error("Caller {caller} is not a governer")]
    NotGoverner { caller: Address },

    #[error("Address {0} is already a governer")]
    AlreadyGoverner(Address),

    #[error("Address {0} is not a governer")]
    UnknownGoverner(Address),

    #[error("Cannot remove the last governer")]
    LastGoverner,

    #[error("Governer set must not be empty")]
    EmptyGovernerSet,
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::NotGovernance { .. }
            | AccessError::GovernanceUnset
            | AccessError::NotGoverner { .. } => ErrorKind::Permission,
            AccessError::AlreadyGoverner(_)
            | AccessError::UnknownGoverner(_)
            | AccessError::LastGoverner
            | AccessError::EmptyGovernerSet => ErrorKind::Precondition,
        }
    }
}

/// Single authority address bootstrapped by the first claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableAuthority {
    holder: Option<Address>,
}

impl ClaimableAuthority {
    pub fn new() -> Self {
        Self { holder: None }
    }

    pub fn holder(&self) -> Option<Address> {
        self.holder
    }

    /// Set the authority to `new_holder`.
    ///
    /// Anyone may claim while unset; afterwards only the current holder may
    /// hand over. Returns the previous holder.
    pub fn set(
        &mut self,
        caller: &Address,
        new_holder: Address,
    ) -> Result<Option<Address>, AccessError> {
        if let Some(current) = self.holder {
            if current != *caller {
                return Err(AccessError::NotGovernance { caller: *caller });
            }
        }
        Ok(self.holder.replace(new_holder))
    }

    /// Check that `caller` holds the authority
    pub fn ensure(&self, caller: &Address) -> Result<(), AccessError> {
        match self.holder {
            Some(holder) if holder == *caller => Ok(()),
            Some(_) => Err(AccessError::NotGovernance { caller: *caller }),
            None => Err(AccessError::GovernanceUnset),
        }
    }
}

/// Self-managing set of governers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernerSet {
    members: BTreeSet<Address>,
}

impl GovernerSet {
    pub fn new<I: IntoIterator<Item = Address>>(initial: I) -> Result<Self, AccessError> {
        let members: BTreeSet<Address> = initial.into_iter().collect();
        if members.is_empty() {
            return Err(AccessError::EmptyGovernerSet);
        }
        Ok(Self { members })
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    pub fn ensure(&self, caller: &Address) -> Result<(), AccessError> {
        if !self.contains(caller) {
            return Err(AccessError::NotGoverner { caller: *caller });
        }
        Ok(())
    }

    pub fn add(&mut self, caller: &Address, governer: Address) -> Result<(), AccessError> {
        self.ensure(caller)?;
        if !self.members.insert(governer) {
            return Err(AccessError::AlreadyGoverner(governer));
        }
        Ok(())
    }

    pub fn remove(&mut self, caller: &Address, governer: &Address) -> Result<(), AccessError> {
        self.ensure(caller)?;
        if !self.members.contains(governer) {
            return Err(AccessError::UnknownGoverner(*governer));
        }
        if self.members.len() == 1 {
            return Err(AccessError::LastGoverner);
        }
        self.members.remove(governer);
        Ok(())
    }
}
