//! VaultGov Simulation Collaborators
//!
//! In-memory stand-ins for the external contracts the vault talks to:
//! - Allocation-weighted staking pool with per-block emission
//! - Two-reserve liquidity pair with transferable ownership shares
//!
//! Both share a [`vaultgov_core::Clock`] with the engines under test.

pub mod emission;
pub mod pricing;

pub use emission::{EmissionSchedule, SimulatedRewardPool};
pub use pricing::SimulatedPair;

/// Emission constants
pub mod constants {
    use vaultgov_core::Amount;

    /// Default reward emitted per block (10 tokens)
    pub const DEFAULT_REWARD_PER_BLOCK: Amount = 10 * vaultgov_core::TOKEN_UNIT;

    /// Emission multiplier while the bonus window is open
    pub const DEFAULT_BONUS_MULTIPLIER: u128 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(constants::DEFAULT_BONUS_MULTIPLIER, 10);
        assert_eq!(constants::DEFAULT_REWARD_PER_BLOCK, 10 * 10u128.pow(18));
    }
}
