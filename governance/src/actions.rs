//! Executable actions
//!
//! A proposal never performs a raw call. Its action names a target address;
//! executing it dispatches `value` and `data` to the [`ActionHandler`]
//! registered for that address.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use vaultgov_core::{Address, Amount, ErrorKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("No action handler registered for {0}")]
    UnregisteredTarget(Address),

    #[error("Action handler for {target} is already registered")]
    AlreadyRegistered { target: Address },

    #[error("Action rejected: {0}")]
    Rejected(String),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::AlreadyRegistered { .. } => ErrorKind::Precondition,
            ActionError::UnregisteredTarget(_) | ActionError::Rejected(_) => {
                ErrorKind::ExternalCall
            }
        }
    }
}

/// Receiver of an executed proposal's call
pub trait ActionHandler: Send + Sync {
    /// Run the call, returning its output data
    fn call(&self, value: Amount, data: &[u8]) -> Result<Vec<u8>, ActionError>;
}

impl<F> ActionHandler for F
where
    F: Fn(Amount, &[u8]) -> Result<Vec<u8>, ActionError> + Send + Sync,
{
    fn call(&self, value: Amount, data: &[u8]) -> Result<Vec<u8>, ActionError> {
        self(value, data)
    }
}

/// Handlers by target address
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<Address, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, target: &Address) -> bool {
        self.handlers.contains_key(target)
    }

    pub fn targets(&self) -> Vec<Address> {
        let mut targets: Vec<Address> = self.handlers.keys().copied().collect();
        targets.sort();
        targets
    }

    pub fn register(
        &mut self,
        target: Address,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), ActionError> {
        if self.handlers.contains_key(&target) {
            return Err(ActionError::AlreadyRegistered { target });
        }
        self.handlers.insert(target, handler);
        Ok(())
    }

    pub fn unregister(&mut self, target: &Address) -> Result<(), ActionError> {
        self.handlers
            .remove(target)
            .map(|_| ())
            .ok_or(ActionError::UnregisteredTarget(*target))
    }

    pub fn dispatch(
        &self,
        target: &Address,
        value: Amount,
        data: &[u8],
    ) -> Result<Vec<u8>, ActionError> {
        let handler = self
            .handlers
            .get(target)
            .ok_or(ActionError::UnregisteredTarget(*target))?;
        handler.call(value, data)
    }
}
