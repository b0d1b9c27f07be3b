//! Two-reserve liquidity pair
//!
//! Ownership shares are an [`InMemoryToken`]; the pair forwards the token
//! interface to it and keeps its own reserve bookkeeping. The first mint
//! issues `sqrt(a0 * a1)` shares, later mints issue shares in proportion to
//! the smaller of the two contributed ratios.

use parking_lot::RwLock;
use std::sync::Arc;
use vaultgov_core::math::{self, MathError};
use vaultgov_core::{
    Address, Amount, Clock, InMemoryToken, PairOracle, Reserves, TokenError, TokenLedger,
};

/// Cloneable handle onto a simulated liquidity pair
#[derive(Clone)]
pub struct SimulatedPair {
    shares: InMemoryToken,
    token0: Address,
    token1: Address,
    reserves: Arc<RwLock<Reserves>>,
    clock: Arc<dyn Clock>,
}

impl SimulatedPair {
    /// Create a pair over `token_a` and `token_b`; the two are sorted so that
    /// `token0` is the lower address
    pub fn new(
        address: Address,
        token_a: Address,
        token_b: Address,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (token0, token1) = if token_a <= token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        Self {
            shares: InMemoryToken::new(address, "PAIR"),
            token0,
            token1,
            reserves: Arc::new(RwLock::new(Reserves::default())),
            clock,
        }
    }

    /// Overwrite the reserves, stamped with the current time
    pub fn set_reserves(&self, reserve0: Amount, reserve1: Amount) {
        *self.reserves.write() = Reserves {
            reserve0,
            reserve1,
            block_timestamp_last: self.clock.now(),
        };
    }

    /// Set the reserves by token rather than by side: `amount` of `token`
    /// and `other` of its counterpart
    pub fn set_reserves_for(&self, token: &Address, amount: Amount, other: Amount) {
        if *token == self.token0 {
            self.set_reserves(amount, other);
        } else {
            self.set_reserves(other, amount);
        }
    }

    /// Reserve held of `token`, if it is one of the pair's tokens
    pub fn reserve_of(&self, token: &Address) -> Option<Amount> {
        let reserves = self.reserves.read();
        if *token == self.token0 {
            Some(reserves.reserve0)
        } else if *token == self.token1 {
            Some(reserves.reserve1)
        } else {
            None
        }
    }

    /// Add `amount0`/`amount1` to the reserves and mint the resulting shares
    /// to `provider`. Returns the number of shares minted.
    pub fn seed_liquidity(
        &self,
        provider: &Address,
        amount0: Amount,
        amount1: Amount,
    ) -> Result<Amount, MathError> {
        let supply = self.shares.total_supply();
        let current = *self.reserves.read();

        let minted = if supply == 0 {
            math::isqrt(math::mul(amount0, amount1)?)
        } else {
            let by0 = math::mul_div(amount0, supply, current.reserve0)?;
            let by1 = math::mul_div(amount1, supply, current.reserve1)?;
            by0.min(by1)
        };

        let reserve0 = math::add(current.reserve0, amount0)?;
        let reserve1 = math::add(current.reserve1, amount1)?;
        self.shares
            .mint(provider, minted)
            .map_err(|_| MathError::Overflow("share supply"))?;
        self.set_reserves(reserve0, reserve1);

        log::debug!(
            "Pair {} minted {} shares to {} (reserves {}/{})",
            self.shares.address(),
            minted,
            provider,
            reserve0,
            reserve1
        );
        Ok(minted)
    }

    /// Mint shares without touching the reserves
    pub fn mint_shares(&self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.shares.mint(to, amount)
    }
}

impl TokenLedger for SimulatedPair {
    fn address(&self) -> Address {
        self.shares.address()
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.shares.balance_of(holder)
    }

    fn total_supply(&self) -> Amount {
        self.shares.total_supply()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.shares.allowance(owner, spender)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.shares.transfer(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.shares.transfer_from(spender, from, to, amount)
    }

    fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.shares.approve(owner, spender, amount)
    }
}

impl PairOracle for SimulatedPair {
    fn token0(&self) -> Address {
        self.token0
    }

    fn token1(&self) -> Address {
        self.token1
    }

    fn get_reserves(&self) -> Reserves {
        *self.reserves.read()
    }
}
