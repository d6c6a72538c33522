//! Platform fee arithmetic
//!
//! One definition shared by withdrawal approval and escrow release: 2% of the
//! gross amount, rounded half away from zero, in whole currency units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Platform fee rate: 2%
const FEE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Compute `(fee, net)` for a gross amount.
///
/// `fee = round(gross × 0.02)`, `net = gross − fee`.
pub fn platform_fee(gross: u64) -> (u64, u64) {
    let fee = (Decimal::from(gross) * FEE_RATE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0);

    // 2% of gross always fits under gross for gross >= 1
    let fee = fee.min(gross);
    (fee, gross - fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_example() {
        // gross=1000 -> fee 20, net 980
        assert_eq!(platform_fee(1000), (20, 980));
    }

    #[test]
    fn test_escrow_example() {
        // totalAmount=10000 -> released 9800, fee 200
        assert_eq!(platform_fee(10000), (200, 9800));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 25 × 0.02 = 0.5 rounds up to 1
        assert_eq!(platform_fee(25), (1, 24));
        // 24 × 0.02 = 0.48 rounds down to 0
        assert_eq!(platform_fee(24), (0, 24));
        // 75 × 0.02 = 1.5 rounds up to 2
        assert_eq!(platform_fee(75), (2, 73));
    }

    #[test]
    fn test_small_amounts_never_underflow() {
        assert_eq!(platform_fee(0), (0, 0));
        assert_eq!(platform_fee(1), (0, 1));
    }
}
