//! The win probability engine. All probabilities are integer basis points
//! (10_000 == 100%).

use cosmwasm_std::Uint128;

use crate::boost::BOOST_PRECISION;

/// Base probability cap: 10%
pub const BASE_PROBABILITY_CAP_BPS: u64 = 1_000;

/// Absolute cap after boosting: 25%
pub const MAX_PROBABILITY_CAP_BPS: u64 = 2_500;

/// 10 bps (0.1%) of win probability per 100 whole units of swapped
/// native token.
const UNITS_PER_STEP: u128 = 100;
const BPS_PER_STEP: u128 = 10;

/// Base win probability for a swap of `amount` whole native units.
/// Monotonically non-decreasing, constant above the cap.
pub fn base_probability_bps(amount: Uint128) -> u64 {
    let bps = amount
        .u128()
        .saturating_mul(BPS_PER_STEP)
        .checked_div(UNITS_PER_STEP)
        .unwrap_or_default();
    let bps = bps.min(BASE_PROBABILITY_CAP_BPS as u128);
    bps as u64
}

/// Applies the boost multiplier and the absolute probability cap.
pub fn effective_probability_bps(base_bps: u64, multiplier_bps: u64) -> u64 {
    let boosted = (base_bps as u128) * (multiplier_bps as u128) / (BOOST_PRECISION as u128);
    boosted.min(MAX_PROBABILITY_CAP_BPS as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_probability_scales_linearly_up_to_cap() {
        assert_eq!(base_probability_bps(Uint128::new(0)), 0);
        // 100 units -> 0.1%
        assert_eq!(base_probability_bps(Uint128::new(100)), 10);
        // 1_000 units -> 1%
        assert_eq!(base_probability_bps(Uint128::new(1_000)), 100);
        // 10_000 units -> 10% (the cap)
        assert_eq!(base_probability_bps(Uint128::new(10_000)), 1_000);
    }

    #[test]
    fn base_probability_is_constant_beyond_cap() {
        // Swaps of 10_000 and 25_000 units produce identical base probability
        assert_eq!(
            base_probability_bps(Uint128::new(10_000)),
            base_probability_bps(Uint128::new(25_000)),
        );
        assert_eq!(base_probability_bps(Uint128::MAX), 1_000);
    }

    #[test]
    fn effective_probability_applies_multiplier_and_cap() {
        // No boost: unchanged
        assert_eq!(effective_probability_bps(1_000, 10_000), 1_000);
        // 1.5x boost on 5%
        assert_eq!(effective_probability_bps(500, 15_000), 750);
        // 10% base at 2.5x hits the 25% cap exactly
        assert_eq!(effective_probability_bps(1_000, 25_000), 2_500);
        // Cap holds even for absurd inputs
        assert_eq!(effective_probability_bps(10_000, 50_000), 2_500);
    }
}
