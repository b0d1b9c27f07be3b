//! VaultGov Core Library
//!
//! Primitives shared by the vault accounting engine and the governance
//! state machine:
//! - Ledger addresses and numeric aliases
//! - Checked fixed-point arithmetic
//! - Time and block sources
//! - Token ledger, staking pool and liquidity pair interfaces
//! - Access control (claimable authority, governer set)
//! - TOML configuration loading

pub mod access;
pub mod address;
pub mod clock;
pub mod config;
pub mod error;
pub mod math;
pub mod oracle;
pub mod token;

pub use access::{AccessError, ClaimableAuthority, GovernerSet};
pub use address::{Address, AddressParseError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ConfigError;
pub use error::ErrorKind;
pub use math::{MathError, ACC_REWARD_PRECISION};
pub use oracle::{OracleError, PairOracle, PoolInfo, Reserves, RewardOracle};
pub use token::{InMemoryToken, TokenError, TokenLedger};

/// Token amount in base units
pub type Amount = u128;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Ledger block height
pub type BlockNumber = u64;

/// Slot of a pool inside the external staking contract
pub type PoolId = u64;

/// Seconds per day
pub const DAY: u64 = 86_400;

/// Base units per whole token (18 decimals)
pub const TOKEN_UNIT: Amount = 1_000_000_000_000_000_000;
