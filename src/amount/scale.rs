//! Rescaling of integral token amounts between fixed-point decimal precisions

use ethers::types::U256;

/// Scale `amount` from `from_decimals` to `to_decimals`.
///
/// Scaling up multiplies by a power of ten and is exact; scaling down uses
/// integer floor division and discards the fractional remainder (truncation,
/// never rounding). Equal precisions are the identity.
pub fn scale(amount: U256, from_decimals: u8, to_decimals: u8) -> U256 {
    match to_decimals.cmp(&from_decimals) {
        std::cmp::Ordering::Equal => amount,
        std::cmp::Ordering::Greater => {
            let factor = U256::exp10((to_decimals - from_decimals) as usize);
            // Saturate rather than panic on amounts near the U256 ceiling
            amount.checked_mul(factor).unwrap_or(U256::MAX)
        }
        std::cmp::Ordering::Less => {
            let factor = U256::exp10((from_decimals - to_decimals) as usize);
            amount / factor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_on_equal_decimals() {
        let x = U256::from(123_456_789u64);
        assert_eq!(scale(x, 18, 18), x);
        assert_eq!(scale(U256::zero(), 6, 6), U256::zero());
    }

    #[test]
    fn scaling_up_is_exact() {
        assert_eq!(
            scale(U256::from(5u64), 6, 18),
            U256::from(5u64) * U256::exp10(12)
        );
    }

    #[test]
    fn scaling_down_truncates() {
        // 1.5 in 18 decimals down to 6 decimals keeps only the floor
        let amount = U256::from(1_500_000_000_000_000_001u64);
        assert_eq!(scale(amount, 18, 6), U256::from(1_500_000u64));
    }

    #[test]
    fn round_trip_never_gains() {
        let cases = [
            U256::zero(),
            U256::from(1u64),
            U256::from(999_999_999_999u64),
            U256::from(1_000_000_000_000u64),
            U256::from(7) * U256::exp10(18),
            U256::from(7) * U256::exp10(18) + U256::from(42u64),
        ];
        for x in cases {
            let rt = scale(scale(x, 18, 6), 6, 18);
            assert!(rt <= x, "round trip gained value for {}", x);
            let lossless = x % U256::exp10(12) == U256::zero();
            assert_eq!(rt == x, lossless, "equality iff x % 10^12 == 0 for {}", x);
        }
    }
}
