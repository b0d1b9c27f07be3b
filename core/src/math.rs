//! Checked fixed-point arithmetic
//!
//! All ledger arithmetic goes through these helpers so that overflow,
//! underflow and division by zero abort the operation instead of wrapping.

use crate::error::ErrorKind;
use crate::Amount;
use thiserror::Error;

/// Scale of the staking pool's accumulated-reward-per-share counter
pub const ACC_REWARD_PRECISION: Amount = 1_000_000_000_000;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Arithmetic underflow: {lhs} - {rhs}")]
    Underflow { lhs: Amount, rhs: Amount },

    #[error("Division by zero")]
    DivisionByZero,
}

impl MathError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Arithmetic
    }
}

pub fn add(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow("add"))
}

pub fn sub(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_sub(b)
        .ok_or(MathError::Underflow { lhs: a, rhs: b })
}

pub fn mul(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow("mul"))
}

pub fn div(a: Amount, b: Amount) -> Result<Amount, MathError> {
    if b == 0 {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}

/// `a * b / d`, rounding down
pub fn mul_div(a: Amount, b: Amount, d: Amount) -> Result<Amount, MathError> {
    div(mul(a, b)?, d)
}

/// Add a duration to a timestamp
pub fn add_secs(t: u64, secs: u64) -> Result<u64, MathError> {
    t.checked_add(secs).ok_or(MathError::Overflow("timestamp add"))
}

/// Integer square root (floor) using Newton's method
pub fn isqrt(n: Amount) -> Amount {
    if n < 2 {
        return n;
    }

    // Start from a power of two that is never below the root
    let bits = 128 - n.leading_zeros();
    let mut x: Amount = 1 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_checked_ops() {
        assert_eq!(add(2, 3).unwrap(), 5);
        assert_eq!(sub(5, 3).unwrap(), 2);
        assert_eq!(mul(4, 5).unwrap(), 20);
        assert_eq!(div(20, 6).unwrap(), 3);

        assert_eq!(add(Amount::MAX, 1), Err(MathError::Overflow("add")));
        assert_eq!(sub(1, 2), Err(MathError::Underflow { lhs: 1, rhs: 2 }));
        assert_eq!(mul(Amount::MAX, 2), Err(MathError::Overflow("mul")));
        assert_eq!(div(1, 0), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_mul_div_rounds_down() {
        assert_eq!(mul_div(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div(0, 3, 4).unwrap(), 0);
        assert!(mul_div(1, 1, 0).is_err());
    }

    #[test]
    fn test_isqrt_small_values() {
        let expected = [0, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3];
        for (n, root) in expected.iter().enumerate() {
            assert_eq!(isqrt(n as Amount), *root, "isqrt({})", n);
        }
        assert_eq!(isqrt(10_000), 100);
        assert_eq!(isqrt(10u128.pow(36)), 10u128.pow(18));
    }

    #[test]
    fn test_isqrt_extremes() {
        let root = isqrt(Amount::MAX);
        assert_eq!(root, u64::MAX as Amount);
    }

    #[test]
    fn test_isqrt_is_floor_root() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1_000 {
            let n: Amount = rng.random_range(0..=10u128.pow(30));
            let r = isqrt(n);
            assert!(r * r <= n);
            assert!((r + 1) * (r + 1) > n);
        }
    }

    #[test]
    fn test_isqrt_monotonic_and_sublinear() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1_000 {
            let x: Amount = rng.random_range(1..=10u128.pow(24));
            let y: Amount = rng.random_range(x..=x * 2);
            assert!(isqrt(y) >= isqrt(x));
            // Quadrupling the input at most doubles the root, up to one unit of flooring
            assert!(isqrt(4 * x) <= 2 * isqrt(x) + 1);
        }
    }
}
