//! Fungible token ledger interface
//!
//! Both the reward token and the liquidity-pool share token are reached
//! through [`TokenLedger`]. Because the host has no implicit message sender,
//! every mutating call names the acting address explicitly.

use crate::error::ErrorKind;
use crate::{Address, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance of {holder}: requested {requested}, available {available}")]
    InsufficientBalance {
        holder: Address,
        requested: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance from {owner} to {spender}: requested {requested}, allowed {allowed}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        requested: Amount,
        allowed: Amount,
    },

    #[error("Token supply overflow")]
    SupplyOverflow,
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ExternalCall
    }
}

/// Standard transfer interface of a fungible token
pub trait TokenLedger: Send + Sync {
    /// Address of the token contract
    fn address(&self) -> Address;

    fn balance_of(&self, holder: &Address) -> Amount;

    fn total_supply(&self) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `from` (the caller) to `to`
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Set the allowance `owner` grants to `spender`
    fn approve(&self, owner: &Address, spender: &Address, amount: Amount)
        -> Result<(), TokenError>;
}

#[derive(Debug, Clone, Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenState {
    fn debit(&mut self, holder: &Address, amount: Amount) -> Result<(), TokenError> {
        let available = self.balances.get(holder).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                holder: *holder,
                requested: amount,
                available,
            });
        }
        self.balances.insert(*holder, available - amount);
        Ok(())
    }

    fn credit(&mut self, holder: &Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.balances.entry(*holder).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        Ok(())
    }

    fn move_funds(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        // Check the receiving side first so a failed credit never leaves a debit behind
        let to_balance = self.balances.get(to).copied().unwrap_or(0);
        if from != to && to_balance.checked_add(amount).is_none() {
            return Err(TokenError::SupplyOverflow);
        }
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

/// In-memory token ledger.
///
/// Cloning yields another handle onto the same balances, so the same token can
/// be shared between the vault, the staking pool and the test harness.
#[derive(Debug, Clone)]
pub struct InMemoryToken {
    address: Address,
    symbol: String,
    state: Arc<RwLock<TokenState>>,
}

impl InMemoryToken {
    pub fn new(address: Address, symbol: &str) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            state: Arc::new(RwLock::new(TokenState::default())),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        state.credit(to, amount)?;
        state.total_supply = supply;

        log::debug!("{} minted {} to {}", self.symbol, amount, to);
        Ok(())
    }

    /// Destroy `amount` tokens held by `from`
    pub fn burn(&self, from: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.write();
        state.debit(from, amount)?;
        state.total_supply -= amount;
        Ok(())
    }
}

impl TokenLedger for InMemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.state.read().balances.get(holder).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.state.write().move_funds(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let allowed = state
            .allowances
            .get(&(*from, *spender))
            .copied()
            .unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                requested: amount,
                allowed,
            });
        }

        state.move_funds(from, to, amount)?;

        // Amount::MAX is an unlimited approval and is never consumed
        if allowed != Amount::MAX {
            state.allowances.insert((*from, *spender), allowed - amount);
        }
        Ok(())
    }

    fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.state.write().allowances.insert((*owner, *spender), amount);
        Ok(())
    }
}
