//! VaultGov Vault
//!
//! Token-locking vault that:
//! - Takes custody of reward tokens and liquidity-pair shares
//! - Stakes the shares and settles the staking reward per account
//! - Derives linear and quadratic voting power from deposits
//! - Blocks withdrawal while governance has an account frozen

pub mod account;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;
pub mod vault;

pub use account::Account;
pub use config::{VaultConfig, DEFAULT_QUADRATIC_SCALE};
pub use error::{Result, VaultError};
pub use escrow::{SharedVault, VotingEscrow};
pub use events::VaultEvent;
pub use vault::{ReserveSide, Vault, VaultCollaborators, VaultSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(DEFAULT_QUADRATIC_SCALE, 10u128.pow(9));
    }
}
