//! Slippage and deadline bounds for on-chain calls
//!
//! Minimum-output amounts are basis-point math over `U256`; deadlines are
//! anchored to chain time supplied by the caller, never the local clock.

use crate::error::{EngineError, EngineResult};
use ethers::types::{U256, U512};

const BPS_DENOMINATOR: u64 = 10_000;

/// Slippage-protected minimum output: `amount_out - floor(amount_out * bps / 10000)`.
///
/// Tolerances at or above 10000 bps floor the result at zero.
pub fn min_out(amount_out: U256, slippage_bps: u32) -> U256 {
    let cut = amount_out.full_mul(U256::from(slippage_bps)) / U512::from(BPS_DENOMINATOR);
    let cut = U256::try_from(cut).unwrap_or(U256::MAX);
    amount_out.saturating_sub(cut)
}

/// Deadline timestamp `chain_now_secs + minutes * 60`.
///
/// `chain_now_secs` must come from the chain's latest block; the ledger's
/// time source is not guaranteed to equal wall-clock Unix time.
pub fn deadline(chain_now_secs: u64, minutes: u32) -> EngineResult<u64> {
    if minutes == 0 {
        return Err(EngineError::Validation(
            "deadline must be strictly in the future".to_string(),
        ));
    }
    Ok(chain_now_secs + minutes as u64 * 60)
}

/// Clamp a caller-supplied amount to the maximum permissible amount,
/// tolerating `slack_bps` of upstream display rounding.
///
/// Within the slack the amount clamps to `max`; beyond it the request is
/// rejected outright rather than silently clamped.
pub fn clamp_with_slack(requested: U256, max: U256, slack_bps: u32) -> EngineResult<U256> {
    if requested <= max {
        return Ok(requested);
    }
    let slack = U256::try_from(max.full_mul(U256::from(slack_bps)) / U512::from(BPS_DENOMINATOR))
        .unwrap_or(U256::MAX);
    if requested <= max.saturating_add(slack) {
        return Ok(max);
    }
    Err(EngineError::Validation(format!(
        "amount {} exceeds the maximum permitted {}",
        requested, max
    )))
}

/// Constant-ratio paired amount for liquidity provision:
/// `amount_a * reserve_b / reserve_a`.
///
/// No ratio exists when either reserve is zero.
pub fn paired_amount(amount_a: U256, reserve_a: U256, reserve_b: U256) -> Option<U256> {
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return None;
    }
    amount_a.checked_mul(reserve_b).map(|num| num / reserve_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_out_at_one_percent() {
        assert_eq!(min_out(U256::from(10_000u64), 100), U256::from(9_900u64));
    }

    #[test]
    fn min_out_floors_at_zero() {
        assert_eq!(min_out(U256::from(10_000u64), 10_000), U256::zero());
        assert_eq!(min_out(U256::from(10_000u64), 20_000), U256::zero());
    }

    #[test]
    fn min_out_monotone_in_slippage() {
        let amount = U256::from(1_234_567u64);
        let mut prev = min_out(amount, 0);
        for bps in [1u32, 10, 100, 500, 2_500, 9_999, 10_000] {
            let next = min_out(amount, bps);
            assert!(next <= prev, "min_out increased at {} bps", bps);
            prev = next;
        }
    }

    #[test]
    fn deadline_from_chain_time() {
        let t = 1_700_000_000u64;
        assert_eq!(deadline(t, 20).unwrap(), t + 1_200);
        assert!(deadline(t, 0).is_err());
    }

    #[test]
    fn clamp_passes_amounts_within_max() {
        let max = U256::from(1_000_000u64);
        assert_eq!(
            clamp_with_slack(U256::from(999_999u64), max, 1).unwrap(),
            U256::from(999_999u64)
        );
        assert_eq!(clamp_with_slack(max, max, 1).unwrap(), max);
    }

    #[test]
    fn clamp_absorbs_rounding_slack() {
        // 0.01% of 1_000_000 is 100
        let max = U256::from(1_000_000u64);
        assert_eq!(
            clamp_with_slack(U256::from(1_000_100u64), max, 1).unwrap(),
            max
        );
        assert!(clamp_with_slack(U256::from(1_000_101u64), max, 1).is_err());
    }

    #[test]
    fn paired_amount_constant_ratio() {
        assert_eq!(
            paired_amount(
                U256::from(100u64),
                U256::from(1_000u64),
                U256::from(2_000u64)
            ),
            Some(U256::from(200u64))
        );
    }

    #[test]
    fn paired_amount_requires_both_reserves() {
        assert_eq!(
            paired_amount(U256::from(100u64), U256::zero(), U256::from(2_000u64)),
            None
        );
        assert_eq!(
            paired_amount(U256::from(100u64), U256::from(1_000u64), U256::zero()),
            None
        );
    }
}
